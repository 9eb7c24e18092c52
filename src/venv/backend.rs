use crate::subprocess::{ProcessCommand, ProcessCommandBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// How isolated environments are created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenvBackend {
    /// `python -m venv <dir>`
    #[default]
    Venv,
    /// `virtualenv -p <python> <dir>`
    Virtualenv,
    /// No isolation, commands run against the host interpreter
    #[serde(rename = "none")]
    Disabled,
}

impl VenvBackend {
    /// Command that creates an environment at `dir`, if this backend creates one
    pub fn creation_command(&self, interpreter: &Path, dir: &Path) -> Option<ProcessCommand> {
        let interpreter = interpreter.to_string_lossy();
        let dir = dir.to_string_lossy();
        match self {
            VenvBackend::Venv => Some(
                ProcessCommandBuilder::new(&interpreter)
                    .args(["-m", "venv", dir.as_ref()])
                    .capture_output(true)
                    .build(),
            ),
            VenvBackend::Virtualenv => Some(
                ProcessCommandBuilder::new("virtualenv")
                    .args(["-p", interpreter.as_ref(), dir.as_ref()])
                    .capture_output(true)
                    .build(),
            ),
            VenvBackend::Disabled => None,
        }
    }
}

impl fmt::Display for VenvBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VenvBackend::Venv => "venv",
            VenvBackend::Virtualenv => "virtualenv",
            VenvBackend::Disabled => "none",
        };
        write!(f, "{name}")
    }
}
