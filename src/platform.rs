//! Host platform detection for conditional session steps

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system family the orchestrator is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    OtherUnix,
}

impl Platform {
    /// Detect current platform
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::OtherUnix
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Directory inside a virtual environment holding its executables
    pub fn venv_bin_dir(&self) -> &'static str {
        if self.is_windows() {
            "Scripts"
        } else {
            "bin"
        }
    }

    /// Suffix appended to executable names
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::OtherUnix => "unix",
        };
        write!(f, "{name}")
    }
}

/// Platform selector used in session file conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformSelector {
    Windows,
    Linux,
    Macos,
    /// Any non-Windows host
    Unix,
}

impl PlatformSelector {
    pub fn matches(&self, platform: Platform) -> bool {
        match self {
            PlatformSelector::Windows => platform == Platform::Windows,
            PlatformSelector::Linux => platform == Platform::Linux,
            PlatformSelector::Macos => platform == Platform::MacOs,
            PlatformSelector::Unix => platform != Platform::Windows,
        }
    }
}
