use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use super::cancel::CancelSignal;
use super::error::ProcessError;

/// Time between SIGTERM and SIGKILL when tearing down an interrupted command
#[cfg(unix)]
const GROUP_KILL_GRACE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Overlay applied on top of the inherited environment
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    /// Capture stdout/stderr instead of streaming them to the terminal
    pub capture_output: bool,
}

impl ProcessCommand {
    /// Shell-quoted command line, for logs and error messages
    pub fn display(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(self.args.iter()))
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// Stdout followed by stderr, as shown to users when a command fails
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }

    /// Exit code as a shell would report it (128 + signal for signalled processes)
    pub fn shell_code(&self) -> i32 {
        match self {
            ExitStatus::Signal(signal) => 128 + signal,
            other => other.code().unwrap_or(1),
        }
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

/// Spawns real child processes and kills them when the cancel signal trips
pub struct TokioProcessRunner {
    cancel: CancelSignal,
}

impl TokioProcessRunner {
    pub fn new(cancel: CancelSignal) -> Self {
        Self { cancel }
    }

    /// Log command execution details
    fn log_command_start(command: &ProcessCommand) {
        tracing::debug!("Executing subprocess: {}", command.display());

        if !command.env.is_empty() {
            tracing::trace!("Environment overlay: {:?}", command.env);
        }

        if let Some(ref dir) = command.working_dir {
            tracing::trace!("Working directory: {:?}", dir);
        }
    }

    /// Configure the command with environment, working directory and stdio
    fn configure_command(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);

        // Own process group so an interrupt reaches us first and cancellation can
        // take down everything the command started
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        cmd.args(&command.args);
        cmd.envs(&command.env);

        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        cmd.kill_on_drop(true);
        Self::configure_stdio(&mut cmd, command);
        cmd
    }

    fn configure_stdio(cmd: &mut tokio::process::Command, command: &ProcessCommand) {
        if command.capture_output {
            cmd.stdin(Stdio::null());
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdin(Stdio::inherit());
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
        }
    }

    /// Convert process exit status to our ExitStatus enum
    fn parse_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        if status.success() {
            ExitStatus::Success
        } else if let Some(code) = status.code() {
            ExitStatus::Error(code)
        } else {
            Self::parse_signal_status(status)
        }
    }

    /// Parse signal status on Unix systems
    #[cfg(unix)]
    fn parse_signal_status(status: std::process::ExitStatus) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            ExitStatus::Signal(signal)
        } else {
            ExitStatus::Error(1)
        }
    }

    #[cfg(not(unix))]
    fn parse_signal_status(_status: std::process::ExitStatus) -> ExitStatus {
        ExitStatus::Error(1)
    }

    /// Log the process execution result
    fn log_result(result: &ProcessOutput, command: &ProcessCommand) {
        match &result.status {
            ExitStatus::Success => {
                tracing::debug!(
                    "Subprocess completed successfully in {:?}: {}",
                    result.duration,
                    command.display()
                );
            }
            ExitStatus::Error(code) => {
                tracing::debug!(
                    "Subprocess failed with exit code {} in {:?}: {}",
                    code,
                    result.duration,
                    command.display()
                );
                if !result.stderr.is_empty() {
                    tracing::trace!("Stderr: {}", result.stderr);
                }
            }
            ExitStatus::Signal(signal) => {
                tracing::warn!(
                    "Subprocess terminated by signal {} in {:?}: {}",
                    signal,
                    result.duration,
                    command.display()
                );
            }
        }
    }

    /// Terminate the child's whole process group, background jobs included
    #[cfg(unix)]
    async fn terminate_group(pid: Option<u32>) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = pid else {
            return;
        };
        // Negative pid addresses the process group created in configure_command
        let group = Pid::from_raw(-(pid as i32));
        let _ = kill(group, Signal::SIGTERM);

        tokio::time::sleep(GROUP_KILL_GRACE).await;

        if let Err(e) = kill(group, Signal::SIGKILL) {
            tracing::trace!("Process group {} already gone: {}", pid, e);
        }
    }

    #[cfg(not(unix))]
    async fn terminate_group(_pid: Option<u32>) {}

    /// Map spawn error to ProcessError
    fn map_spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        tracing::error!(
            "Failed to spawn '{}': {:?} (kind: {:?})",
            command.program,
            error,
            error.kind()
        );

        if error.kind() == std::io::ErrorKind::NotFound {
            ProcessError::CommandNotFound(command.program.clone())
        } else {
            ProcessError::SpawnFailed {
                command: command.display(),
                source: error,
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        if self.cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        let start = Instant::now();
        Self::log_command_start(&command);

        let child = Self::configure_command(&command)
            .spawn()
            .map_err(|e| Self::map_spawn_error(e, &command))?;
        let pid = child.id();

        // Dropping the wait future drops the child, and kill_on_drop terminates it.
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = self.cancel.cancelled() => {
                tracing::warn!("Killing interrupted command: {}", command.display());
                Self::terminate_group(pid).await;
                return Err(ProcessError::Cancelled);
            }
        };

        let result = ProcessOutput {
            status: Self::parse_exit_status(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        };

        Self::log_result(&result, &command);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_command(program: &str, args: &[&str]) -> ProcessCommand {
        ProcessCommand {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            env: HashMap::new(),
            working_dir: None,
            capture_output: true,
        }
    }

    #[test]
    fn test_display_quotes_arguments() {
        let command = test_command("sphinx-build", &["-b", "html", "source", "_build/my docs"]);
        assert_eq!(
            command.display(),
            "sphinx-build -b html source '_build/my docs'"
        );
    }

    #[test]
    fn test_combined_output() {
        let output = ProcessOutput {
            status: ExitStatus::Error(1),
            stdout: "Collecting foo\n".to_string(),
            stderr: "ERROR: no such package\n".to_string(),
            duration: Duration::ZERO,
        };
        assert_eq!(
            output.combined_output(),
            "Collecting foo\nERROR: no such package\n"
        );
    }

    #[test]
    fn test_shell_code() {
        assert_eq!(ExitStatus::Success.shell_code(), 0);
        assert_eq!(ExitStatus::Error(3).shell_code(), 3);
        assert_eq!(ExitStatus::Signal(9).shell_code(), 137);
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_exit_status() {
        use std::os::unix::process::ExitStatusExt;

        let status = std::process::ExitStatus::from_raw(0);
        assert_eq!(
            TokioProcessRunner::parse_exit_status(status),
            ExitStatus::Success
        );

        // Exit code 1 is encoded in the high byte
        let status = std::process::ExitStatus::from_raw(256);
        assert_eq!(
            TokioProcessRunner::parse_exit_status(status),
            ExitStatus::Error(1)
        );

        let status = std::process::ExitStatus::from_raw(9);
        assert_eq!(
            TokioProcessRunner::parse_exit_status(status),
            ExitStatus::Signal(9)
        );
    }

    #[cfg(target_os = "linux")]
    fn process_alive(pid: i32) -> bool {
        // Orphans may linger as zombies when nothing reaps them; those count as gone
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => !stat.contains(") Z"),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_cancel_kills_background_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("sleep.pid");
        let script = format!("sleep 30 & echo $! > '{}'; wait", pid_file.display());

        let cancel = CancelSignal::new();
        let runner = TokioProcessRunner::new(cancel.clone());
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let result = runner.run(test_command("sh", &["-c", &script])).await;
        assert!(matches!(result, Err(ProcessError::Cancelled)));

        let pid: i32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let mut alive = process_alive(pid);
        for _ in 0..40 {
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            alive = process_alive(pid);
        }
        assert!(!alive, "background sleep {pid} outlived the cancelled command");
    }

    #[test]
    fn test_map_spawn_error_not_found() {
        let command = test_command("nonexistent_command_12345", &[]);
        let err = TokioProcessRunner::map_spawn_error(
            std::io::Error::from(std::io::ErrorKind::NotFound),
            &command,
        );
        assert!(matches!(err, ProcessError::CommandNotFound(p) if p == "nonexistent_command_12345"));
    }
}
