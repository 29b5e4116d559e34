use metrics::counter;

use super::{InternalEvent, error_stage, error_type};
use crate::kubernetes::{MetadataField, ObjectKey};

#[derive(Debug)]
pub struct KubernetesEventReceived<'a> {
    pub namespace: &'a str,
    pub reason: &'a str,
    pub message: &'a str,
    pub involved_object: &'a str,
    pub count: i64,
}

impl InternalEvent for KubernetesEventReceived<'_> {
    fn emit(self) {
        debug!(
            message = "Received event.",
            event_message = %self.message,
            namespace = %self.namespace,
            reason = %self.reason,
            involved_object = %self.involved_object,
            count = self.count,
        );
        counter!("k8s_events_received_total").increment(1);
    }
}

#[derive(Debug)]
pub struct KubernetesEventDeduplicated {
    pub count: i64,
    pub watermark: i64,
}

impl InternalEvent for KubernetesEventDeduplicated {
    fn emit(self) {
        debug!(
            message = "Skipping already forwarded event.",
            count = self.count,
            watermark = self.watermark,
        );
        counter!("k8s_events_deduplicated_total").increment(1);
    }
}

#[derive(Debug)]
pub struct KubernetesEventForwarded {
    pub count: i64,
}

impl InternalEvent for KubernetesEventForwarded {
    fn emit(self) {
        trace!(message = "Event forwarded to handler.", count = self.count);
        counter!("k8s_events_forwarded_total").increment(1);
    }
}

const WATERMARK_INVALID: &str = "watermark_invalid";

#[derive(Debug)]
pub struct WatermarkParseError<'a> {
    pub value: &'a str,
    pub error: &'a crate::watermark::ParseError,
}

impl InternalEvent for WatermarkParseError<'_> {
    fn emit(self) {
        warn!(
            message = "Ignoring malformed watermark annotation.",
            value = %self.value,
            error = %self.error,
            error_code = WATERMARK_INVALID,
            error_type = error_type::PARSER_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_code" => WATERMARK_INVALID,
            "error_type" => error_type::PARSER_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
    }
}

const ENRICHMENT_FAILED: &str = "enrichment_failed";

#[derive(Debug)]
pub struct MetadataFetchError<'a> {
    pub field: MetadataField,
    pub key: &'a ObjectKey,
    pub error: &'a crate::kubernetes::FetchError,
}

impl InternalEvent for MetadataFetchError<'_> {
    fn emit(self) {
        error!(
            message = "Cannot fetch metadata of the involved object.",
            field = %self.field,
            object = %self.key,
            error = %self.error,
            error_code = ENRICHMENT_FAILED,
            error_type = error_type::READER_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_code" => ENRICHMENT_FAILED,
            "error_type" => error_type::READER_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
        counter!("k8s_event_enrichment_failures_total", "field" => self.field.as_str())
            .increment(1);
    }
}

const WATERMARK_PATCH_FAILED: &str = "watermark_patch_failed";

#[derive(Debug)]
pub struct WatermarkPatchError<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub error: &'a crate::kubernetes::PatchError,
}

impl InternalEvent for WatermarkPatchError<'_> {
    fn emit(self) {
        error!(
            message = "Cannot update watermark annotation of the event.",
            namespace = %self.namespace,
            name = %self.name,
            error = %self.error,
            error_code = WATERMARK_PATCH_FAILED,
            error_type = error_type::REQUEST_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_code" => WATERMARK_PATCH_FAILED,
            "error_type" => error_type::REQUEST_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
    }
}
