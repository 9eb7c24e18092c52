//! Sessions
//!
//! A session is a named unit of work that runs once per declared
//! interpreter version. Bodies only see the [`SessionContext`] capability
//! interface, so they can be driven by the real [`Session`] or by a
//! recording fake in tests.

pub mod args;
mod context;
mod registry;
mod result;

pub use args::{route, ArgPolicy, OptionKind, OptionSpec, ParsedArgs};
pub use context::{Session, SessionContext};
pub use registry::{signature, SessionBody, SessionDefinition, SessionRegistry};
pub use result::{RunResult, RunStatus};
