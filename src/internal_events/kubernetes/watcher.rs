use std::fmt::Debug;

use metrics::counter;

use crate::internal_events::{InternalEvent, error_stage, error_type};

#[derive(Debug)]
pub struct WatchSubscribed<'a> {
    pub namespace: Option<&'a str>,
}

impl InternalEvent for WatchSubscribed<'_> {
    fn emit(self) {
        info!(
            message = "Watching events.",
            namespace = self.namespace.unwrap_or("<all>"),
        );
        counter!("k8s_watch_requests_invoked_total").increment(1);
    }
}

const WATCH_FAILED: &str = "watch_failed";

#[derive(Debug)]
pub struct WatchStreamError<E> {
    pub error: E,
}

impl<E: Debug> InternalEvent for WatchStreamError<E> {
    fn emit(self) {
        warn!(
            message = "Watcher stream received an error. Retrying.",
            error = ?self.error,
            error_code = WATCH_FAILED,
            error_type = error_type::READER_FAILED,
            stage = error_stage::RECEIVING,
        );
        counter!(
            "component_errors_total",
            "error_code" => WATCH_FAILED,
            "error_type" => error_type::READER_FAILED,
            "stage" => error_stage::RECEIVING,
        )
        .increment(1);
        counter!("k8s_watch_stream_errors_total").increment(1);
    }
}
