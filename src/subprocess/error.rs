use crate::error::NoxideError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to spawn {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process cancelled")]
    Cancelled,

    #[error("Mock expectation not met: {0}")]
    MockExpectationNotMet(String),
}

/// Convert ProcessError to NoxideError
impl From<ProcessError> for NoxideError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::CommandNotFound(program) => NoxideError::Spawn {
                message: format!("Program {program} not found"),
                program,
            },
            ProcessError::SpawnFailed { command, source } => NoxideError::Spawn {
                program: command,
                message: source.to_string(),
            },
            ProcessError::Io(source) => NoxideError::Spawn {
                program: String::new(),
                message: source.to_string(),
            },
            ProcessError::Cancelled => NoxideError::Cancelled,
            ProcessError::MockExpectationNotMet(message) => NoxideError::Spawn {
                program: String::from("<mock>"),
                message,
            },
        }
    }
}
