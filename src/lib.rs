//! # noxide
//!
//! Declarative multi-environment session runner.
//!
//! A project declares named sessions (lint, a test matrix, docs, ...) in a
//! session file. Each session runs once per declared interpreter version,
//! inside its own isolated environment, installing dependencies and invoking
//! external tools with pass-through arguments.
//!
//! ## Usage
//!
//! ```bash
//! noxide [-s SESSION...] [-p VERSION...] [-r] [-x] [-- POSARGS...]
//! ```
//!
//! ## Modules
//!
//! - `app` - Logging setup and fatal error handling
//! - `cli` - Command-line parsing and routing
//! - `config` - Declarative session file and its step interpreter
//! - `error` - Error taxonomy and exit codes
//! - `interpreter` - Interpreter discovery
//! - `orchestrator` - Selection, per-run driving and aggregation
//! - `session` - Session registry, context and argument routing
//! - `subprocess` - Process execution abstraction for testing
//! - `testing` - Recording session context for tests
//! - `venv` - Environment creation, caching and reuse
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod orchestrator;
pub mod platform;
pub mod session;
pub mod subprocess;
pub mod venv;

pub mod testing;

pub use error::{NoxideError, Result};
