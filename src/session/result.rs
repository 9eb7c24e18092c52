use crate::error::NoxideError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Outcome of one (session, version) run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed { reason: String, code: u16 },
    /// Not run at all; counts as neither pass nor fail
    Skipped { reason: String },
    Cancelled,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed { .. } => "failed",
            RunStatus::Skipped { .. } => "skipped",
            RunStatus::Cancelled => "cancelled",
        }
    }

    /// Numeric status used in reports
    pub fn result_code(&self) -> i32 {
        match self {
            RunStatus::Cancelled => -1,
            RunStatus::Failed { .. } => 0,
            RunStatus::Success => 1,
            RunStatus::Skipped { .. } => 2,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunStatus::Failed { .. } | RunStatus::Cancelled)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub session_name: String,
    pub interpreter_version: Option<String>,
    pub signature: String,
    pub status: RunStatus,
    pub exit_code: i32,
    pub duration: Duration,
}

impl RunResult {
    pub fn success(
        session_name: &str,
        interpreter_version: Option<&str>,
        signature: &str,
        duration: Duration,
    ) -> Self {
        Self {
            session_name: session_name.to_string(),
            interpreter_version: interpreter_version.map(str::to_string),
            signature: signature.to_string(),
            status: RunStatus::Success,
            exit_code: 0,
            duration,
        }
    }

    pub fn skipped(
        session_name: &str,
        interpreter_version: Option<&str>,
        signature: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: RunStatus::Skipped {
                reason: reason.into(),
            },
            ..Self::success(session_name, interpreter_version, signature, Duration::ZERO)
        }
    }

    /// Convert an error raised by a run into its result
    pub fn from_error(
        session_name: &str,
        interpreter_version: Option<&str>,
        signature: &str,
        error: &NoxideError,
        duration: Duration,
    ) -> Self {
        let status = match error {
            NoxideError::Cancelled => RunStatus::Cancelled,
            other => RunStatus::Failed {
                reason: other.user_message(),
                code: other.code(),
            },
        };
        Self {
            status,
            exit_code: error.exit_code(),
            ..Self::success(session_name, interpreter_version, signature, duration)
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Success
    }
}
