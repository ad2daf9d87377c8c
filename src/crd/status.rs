//! # BlobStorage Status
//!
//! Observed state written exclusively by the reconciler.

use super::SecretRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse lifecycle stage of a BlobStorage instance
///
/// `Pending -> InProgress -> Complete`, with `Failed` reachable from any
/// non-terminal phase and `DeleteInProgress` only once deletion is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, schemars::JsonSchema)]
pub enum StatusPhase {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "deletion in progress")]
    DeleteInProgress,
}

impl StatusPhase {
    /// Wire value, also used as the metrics label
    pub fn as_str(self) -> &'static str {
        match self {
            StatusPhase::Pending => "pending",
            StatusPhase::InProgress => "in progress",
            StatusPhase::Complete => "complete",
            StatusPhase::Failed => "failed",
            StatusPhase::DeleteInProgress => "deletion in progress",
        }
    }
}

impl fmt::Display for StatusPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable status message
///
/// Serialized as a plain string. Failures are recorded as `"<message>: <error>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(transparent)]
pub struct StatusMessage(String);

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Append an error to the message, `"<message>: <error>"`
    #[must_use]
    pub fn wrap_error(&self, err: &dyn fmt::Display) -> Self {
        if self.0.is_empty() {
            return Self(err.to_string());
        }
        Self(format!("{}: {err}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatusMessage {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StatusMessage {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Status of the BlobStorage resource
///
/// Optional fields serialize as `null` so a merge patch clears them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlobStorageStatus {
    /// Current phase
    #[serde(default)]
    pub phase: StatusPhase,
    /// Last progress or failure message
    #[serde(default)]
    pub message: StatusMessage,
    /// Strategy identifier resolved for the deployment type on the last success
    #[serde(default)]
    pub strategy: Option<String>,
    /// Provider that fulfilled the last successful pass
    #[serde(default)]
    pub provider: Option<String>,
    /// Secret holding connection details, echoed from the spec once provisioned
    #[serde(default)]
    pub secret_ref: Option<SecretRef>,
    /// Generation of the spec this status was computed from
    #[serde(default)]
    pub observed_generation: Option<i64>,
}
