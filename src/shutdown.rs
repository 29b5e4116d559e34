use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll, ready},
};

use futures::{FutureExt, channel::oneshot};

/// Creates a connected [`ShutdownTrigger`] and [`ShutdownHandle`].
pub fn shutdown_pair() -> (ShutdownTrigger, ShutdownHandle) {
    let (tx, rx) = oneshot::channel();
    (ShutdownTrigger(tx), ShutdownHandle(rx))
}

/// Requests the shutdown of whatever holds the paired [`ShutdownHandle`].
///
/// Dropping the trigger without calling [`ShutdownTrigger::trigger`] requests
/// the shutdown too.
#[derive(Debug)]
pub struct ShutdownTrigger(oneshot::Sender<()>);

impl ShutdownTrigger {
    pub fn trigger(self) {
        if self.0.send(()).is_err() {
            trace!(
                message = "Error while sending a shutdown, \
                    the receiver is already dropped; \
                    this is not a problem."
            );
        }
    }
}

/// A handle that allows waiting for the shutdown request.
#[derive(Debug)]
pub struct ShutdownHandle(oneshot::Receiver<()>);

impl Future for ShutdownHandle {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        _ = ready!(self.0.poll_unpin(cx));
        Poll::Ready(())
    }
}
