pub mod error_stage {
    pub const RECEIVING: &str = "receiving";
    pub const PROCESSING: &str = "processing";
    pub const SENDING: &str = "sending";
}

pub mod error_type {
    /// The error was caused by a malformed value that could not be parsed.
    pub const PARSER_FAILED: &str = "parser_failed";
    /// Reading from the cluster API failed.
    pub const READER_FAILED: &str = "reader_failed";
    /// A request against the cluster API failed.
    pub const REQUEST_FAILED: &str = "request_failed";
    /// Writing to an output failed.
    pub const WRITER_FAILED: &str = "writer_failed";
    /// The configuration could not be loaded.
    pub const CONFIGURATION_FAILED: &str = "configuration_failed";
}
