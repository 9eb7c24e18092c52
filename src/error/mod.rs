use std::path::PathBuf;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// The unified error type for noxide
///
/// Configuration errors abort the whole run before any session executes.
/// Every other variant is caught at the per-(session, version) boundary and
/// turned into a failed run result.
#[derive(Error, Debug)]
pub enum NoxideError {
    #[error("Session '{name}' is already registered")]
    DuplicateSession { name: String },

    #[error("Unknown session '{name}'")]
    UnknownSession { name: String, available: Vec<String> },

    #[error("Invalid session file: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    #[error("Invalid session arguments: {message}")]
    Argument { message: String },

    #[error("Python interpreter {version} not found")]
    MissingInterpreter { version: String },

    #[error("Installation failed with exit code {exit_code}: {command}")]
    Install {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("Failed to start '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("Command {command} failed with exit code {exit_code}")]
    CommandFailed { command: String, exit_code: i32 },

    #[error("{message}")]
    SessionAborted { message: String },

    #[error("Interrupted by user")]
    Cancelled,

    #[error("Environment error at {}: {message}", path.display())]
    Environment {
        code: u16,
        message: String,
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl NoxideError {
    /// Create a session file error without a path
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create an argument error
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Create an environment error carrying an optional io source
    pub fn environment(
        code: u16,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<std::io::Error>,
    ) -> Self {
        Self::Environment {
            code,
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Fatal errors escape the orchestrator and terminate the whole run
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSession { .. } | Self::UnknownSession { .. } | Self::Config { .. }
        )
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::DuplicateSession { .. } => ErrorCode::CONFIG_DUPLICATE_SESSION,
            Self::UnknownSession { .. } => ErrorCode::CONFIG_UNKNOWN_SESSION,
            Self::Config { .. } => ErrorCode::CONFIG_INVALID_FILE,
            Self::Argument { .. } => ErrorCode::SESSION_INVALID_ARGUMENTS,
            Self::SessionAborted { .. } => ErrorCode::SESSION_ABORTED,
            Self::Cancelled => ErrorCode::SESSION_CANCELLED,
            Self::MissingInterpreter { .. } => ErrorCode::ENV_MISSING_INTERPRETER,
            Self::Environment { code, .. } => *code,
            Self::Spawn { .. } => ErrorCode::EXEC_SPAWN_FAILED,
            Self::Install { .. } => ErrorCode::EXEC_INSTALL_FAILED,
            Self::CommandFailed { .. } => ErrorCode::EXEC_COMMAND_FAILED,
        }
    }

    /// Get the process exit code for this error
    ///
    /// Failed external commands report their own exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DuplicateSession { .. } | Self::UnknownSession { .. } | Self::Config { .. } => 2,
            Self::Argument { .. } | Self::SessionAborted { .. } => 3,
            Self::MissingInterpreter { .. } | Self::Environment { .. } => 4,
            Self::Spawn { .. } => 127,
            Self::Install { exit_code, .. } | Self::CommandFailed { exit_code, .. } => {
                if *exit_code == 0 {
                    1
                } else {
                    *exit_code
                }
            }
            Self::Cancelled => 130,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownSession { name, available } if !available.is_empty() => format!(
                "Sessions not found: {}. Available sessions: {}",
                name,
                available.join(", ")
            ),
            Self::Config {
                message,
                path: Some(path),
            } => format!("Invalid session file {}: {}", path.display(), message),
            Self::Install {
                command,
                exit_code,
                output,
            } if !output.trim().is_empty() => format!(
                "Installation failed with exit code {}: {}\n{}",
                exit_code,
                command,
                output.trim_end()
            ),
            _ => self.to_string(),
        }
    }
}

/// Type alias for Results using NoxideError
pub type Result<T> = std::result::Result<T, NoxideError>;
