//! # Codemap Protocol
//!
//! Request and response envelopes shared by the HTTP surface and the CLI.
//! Failures carry a machine-distinguishable kind next to a human-readable
//! message; callers check for the `error` field rather than relying on a
//! transport-level error channel.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Failure kinds surfaced at the API boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or unacceptable input, correctable by the caller
    InvalidRequest,

    /// Source text does not parse; analysis produced no partial tree
    SyntaxFailure,

    /// Patch line range does not fit the stored text
    InvalidRange,

    /// No stored source under the given file id
    UnknownFile,

    /// Patch was computed against an older revision of the text
    StaleRevision,

    /// Storage collaborator failure
    IoFailure,
}

/// Error payload returned in place of a populated result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub kind: ErrorKind,
}

impl ErrorEnvelope {
    pub fn new(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind,
        }
    }
}

/// Upload-and-analyze request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub file_id: String,
    pub source: String,
}

impl AnalyzeRequest {
    /// Upload validation: a usable file id naming a Python file, and a
    /// non-empty source body.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.file_id.trim().is_empty() {
            return Err("no file id supplied".to_string());
        }
        if !self.file_id.ends_with(".py") {
            return Err(format!(
                "invalid file type: {} (expected a .py file)",
                self.file_id
            ));
        }
        if self.source.trim().is_empty() {
            return Err("empty source".to_string());
        }
        Ok(())
    }
}

/// Successful analysis response; `root` is the serialized module outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub file_id: String,
    pub revision: u64,
    pub root: serde_json::Value,
}

/// Line-range patch request. `expected_revision`, when present, must match
/// the stored record or the patch is refused as stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRequest {
    pub file_id: String,
    pub start_line: usize,
    pub end_line: usize,
    pub replacement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_revision: Option<u64>,
}

/// Patch outcome: a success flag plus either a confirmation or an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl PatchResponse {
    pub fn success(message: impl Into<String>, revision: u64) -> Self {
        Self {
            ok: true,
            message: Some(message.into()),
            revision: Some(revision),
            error: None,
            kind: None,
        }
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: None,
            revision: None,
            error: Some(error.into()),
            kind: Some(kind),
        }
    }
}

/// Current stored text of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceResponse {
    pub file_id: String,
    pub revision: u64,
    pub source: String,
}

/// Liveness probe response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
