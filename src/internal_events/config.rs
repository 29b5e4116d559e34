use std::path::Path;

use metrics::counter;

use super::{InternalEvent, error_stage, error_type};

#[derive(Debug)]
pub struct ConfigLoaded<'a> {
    pub path: &'a Path,
}

impl InternalEvent for ConfigLoaded<'_> {
    fn emit(self) {
        info!(message = "Loaded configuration.", path = ?self.path);
    }
}

#[derive(Debug)]
pub struct ConfigLoadError<'a> {
    pub error: &'a crate::config::LoadError,
}

impl InternalEvent for ConfigLoadError<'_> {
    fn emit(self) {
        error!(
            message = "Configuration error.",
            error = %self.error,
            error_type = error_type::CONFIGURATION_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "config_load_failed",
            "error_type" => error_type::CONFIGURATION_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
    }
}
