//! CLI argument structures

use crate::orchestrator::CliOverrides;
use clap::Parser;
use std::path::PathBuf;

/// Run declarative sessions in isolated Python environments
#[derive(Parser, Debug)]
#[command(name = "noxide")]
#[command(about = "noxide - Run project sessions in isolated, version-pinned environments", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Sessions to run (base names or `<name>-<version>`); defaults apply when omitted
    #[arg(short = 's', long = "session", visible_alias = "sessions", value_name = "SESSION", num_args = 1..)]
    pub sessions: Vec<String>,

    /// Session file to load
    #[arg(short = 'f', long = "noxfile", default_value = "noxide.toml")]
    pub noxfile: PathBuf,

    /// List sessions and exit
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Only run sessions for these interpreter versions
    #[arg(short = 'p', long = "python", value_name = "VERSION", num_args = 1..)]
    pub python: Vec<String>,

    /// Keep environments between runs for sessions that reuse them
    #[arg(short = 'r', long)]
    pub reuse_existing_virtualenvs: bool,

    /// Directory for environments
    #[arg(long, value_name = "DIR")]
    pub envdir: Option<PathBuf>,

    /// Stop after the first failed session
    #[arg(short = 'x', long)]
    pub stop_on_first_error: bool,

    /// Skip install steps in reused environments
    #[arg(long)]
    pub no_install: bool,

    /// Fail sessions whose interpreter is missing
    #[arg(long, conflicts_with = "no_error_on_missing_interpreters")]
    pub error_on_missing_interpreters: bool,

    /// Skip sessions whose interpreter is missing, even on CI
    #[arg(long)]
    pub no_error_on_missing_interpreters: bool,

    /// Run commands without an isolated environment
    #[arg(long)]
    pub no_venv: bool,

    /// Write a JSON report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only show warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Arguments passed through to the sessions
    #[arg(last = true, value_name = "POSARGS")]
    pub posargs: Vec<String>,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        let error_on_missing_interpreters = if self.error_on_missing_interpreters {
            Some(true)
        } else if self.no_error_on_missing_interpreters {
            Some(false)
        } else {
            None
        };

        CliOverrides {
            error_on_missing_interpreters,
            reuse_existing_virtualenvs: self.reuse_existing_virtualenvs,
            envdir: self.envdir.clone(),
            stop_on_first_error: self.stop_on_first_error,
            no_install: self.no_install,
            no_venv: self.no_venv,
            python: self.python.clone(),
            posargs: self.posargs.clone(),
        }
    }
}
