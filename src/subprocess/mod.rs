//! Command executor
//!
//! Every external program noxide starts (environment creation, the package
//! installer, session tools) goes through a [`ProcessRunner`], so tests can
//! swap in [`MockProcessRunner`].

pub mod builder;
pub mod cancel;
pub mod error;
pub mod mock;
pub mod runner;


pub use builder::ProcessCommandBuilder;
pub use cancel::{cancel_on_ctrl_c, CancelSignal};
pub use error::ProcessError;
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner, TokioProcessRunner};
