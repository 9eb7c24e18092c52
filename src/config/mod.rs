//! Declarative session file
//!
//! Sessions are declared as data (TOML or YAML) and interpreted by
//! [`DeclarativeSession`], a [`crate::session::SessionBody`] that runs a
//! list of conditional steps.

mod declarative;
mod file;
pub mod interpolate;
mod step;

pub use declarative::DeclarativeSession;
pub use file::{FileOptions, SessionFile, SessionSpec};
pub use step::{Condition, Conflict, PlatformEnv, Step, StepAction};

#[cfg(test)]
mod tests;
