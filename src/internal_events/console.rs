use metrics::counter;

use super::{InternalEvent, error_stage, error_type};

#[derive(Debug)]
pub struct ConsoleEventProcessed {
    pub byte_size: usize,
}

impl InternalEvent for ConsoleEventProcessed {
    fn emit(self) {
        trace!(message = "Event written.", byte_size = self.byte_size);
        counter!("component_sent_events_total", "protocol" => "console").increment(1);
        counter!("component_sent_event_bytes_total", "protocol" => "console")
            .increment(self.byte_size as u64);
    }
}

#[derive(Debug)]
pub struct ConsoleEncodeError<'a> {
    pub error: &'a serde_json::Error,
}

impl InternalEvent for ConsoleEncodeError<'_> {
    fn emit(self) {
        error!(
            message = "Failed to encode event.",
            error = %self.error,
            error_type = error_type::PARSER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "encode_failed",
            "error_type" => error_type::PARSER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct ConsoleWriteError<'a> {
    pub error: &'a std::io::Error,
}

impl InternalEvent for ConsoleWriteError<'_> {
    fn emit(self) {
        error!(
            message = "Error writing to output.",
            error = %self.error,
            error_type = error_type::WRITER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "write_failed",
            "error_type" => error_type::WRITER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
    }
}
