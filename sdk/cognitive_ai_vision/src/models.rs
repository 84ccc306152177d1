//! Shared response types for the visual recognition service.

use serde::Deserialize;

/// A warning attached to an otherwise successful response, such as a
/// corrupt image that was skipped in a batch.
#[derive(Debug, Clone, Deserialize)]
pub struct WarningInfo {
    /// Codified warning string, such as `limit_reached`.
    pub warning_id: String,

    /// Human-readable description of the warning.
    pub description: String,
}

/// Per-image error details inside a batch response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    /// HTTP status code for this image's failure.
    pub code: u16,

    /// Human-readable description of the error.
    pub description: String,

    /// Codified error string, such as `input_error`.
    pub error_id: String,
}
