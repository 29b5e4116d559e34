use std::io;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SignalTo {
    /// Stop watching, finishing the event being handled.
    Shutdown,
    /// Exit without waiting.
    Quit,
}

/// Waits for the first termination request from the OS or the user.
#[cfg(unix)]
pub async fn signal() -> io::Result<SignalTo> {
    use futures::future::{BoxFuture, FutureExt, select_all};
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let set: Vec<BoxFuture<'_, SignalTo>> = vec![
        Box::pin(sigint.recv().map(|_| SignalTo::Shutdown)),
        Box::pin(sigterm.recv().map(|_| SignalTo::Shutdown)),
        Box::pin(sigquit.recv().map(|_| SignalTo::Quit)),
    ];

    let (signal, _, _) = select_all(set).await;
    Ok(signal)
}

/// Waits for the first termination request from the OS or the user.
#[cfg(windows)]
pub async fn signal() -> io::Result<SignalTo> {
    tokio::signal::ctrl_c().await?;
    Ok(SignalTo::Shutdown)
}
