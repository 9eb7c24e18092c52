//! Command-line interface

pub mod args;
pub mod router;

pub use args::Cli;
pub use router::{execute_command, render_session_list};
