use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};

/// Scriptable [`ProcessRunner`] for tests
///
/// Expectations match on the program (either the exact string or its file
/// name, so `/envs/tests/bin/python` matches `python`) and an optional
/// argument predicate. The first matching expectation answers.
#[derive(Clone)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    call_history: Arc<Mutex<Vec<ProcessCommand>>>,
    allow_unexpected: Arc<AtomicBool>,
}

enum MockResponse {
    Output(ProcessOutput),
    NotFound,
}

struct MockExpectation {
    program: String,
    #[allow(clippy::type_complexity)]
    args_matcher: Option<Box<dyn Fn(&[String]) -> bool + Send + Sync>>,
    response: MockResponse,
    times_called: usize,
    expected_times: Option<usize>,
}

pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: MockExpectation,
}

fn success_output() -> ProcessOutput {
    ProcessOutput {
        status: ExitStatus::Success,
        stdout: String::new(),
        stderr: String::new(),
        duration: Duration::from_millis(10),
    }
}

fn program_matches(expected: &str, actual: &str) -> bool {
    expected == actual
        || Path::new(actual)
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == expected)
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(Vec::new())),
            call_history: Arc::new(Mutex::new(Vec::new())),
            allow_unexpected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Answer commands without a matching expectation with success instead of an error
    pub fn allow_unexpected(&self) -> &Self {
        self.allow_unexpected.store(true, Ordering::SeqCst);
        self
    }

    pub fn expect_command(&mut self, program: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: MockExpectation {
                program: program.to_string(),
                args_matcher: None,
                response: MockResponse::Output(success_output()),
                times_called: 0,
                expected_times: None,
            },
        }
    }

    pub fn verify_called(&self, program: &str, times: usize) -> bool {
        self.calls_to(program).len() == times
    }

    /// All recorded calls whose program matches
    pub fn calls_to(&self, program: &str) -> Vec<ProcessCommand> {
        self.call_history
            .lock()
            .unwrap()
            .iter()
            .filter(|cmd| program_matches(program, &cmd.program))
            .cloned()
            .collect()
    }

    pub fn get_call_history(&self) -> Vec<ProcessCommand> {
        self.call_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.call_history.lock().unwrap().push(command.clone());

        let mut expectations = self.expectations.lock().unwrap();

        for expectation in expectations.iter_mut() {
            if !program_matches(&expectation.program, &command.program) {
                continue;
            }

            if let Some(ref args_matcher) = expectation.args_matcher {
                if !(args_matcher)(&command.args) {
                    continue;
                }
            }

            expectation.times_called += 1;

            if let Some(expected) = expectation.expected_times {
                if expectation.times_called > expected {
                    return Err(ProcessError::MockExpectationNotMet(format!(
                        "Command '{}' called {} times, expected {}",
                        command.program, expectation.times_called, expected
                    )));
                }
            }

            return match &expectation.response {
                MockResponse::Output(output) => Ok(output.clone()),
                MockResponse::NotFound => Err(ProcessError::CommandNotFound(command.program)),
            };
        }

        if self.allow_unexpected.load(Ordering::SeqCst) {
            return Ok(success_output());
        }

        Err(ProcessError::MockExpectationNotMet(format!(
            "No expectation found for command: {} {:?}",
            command.program, command.args
        )))
    }
}

impl MockCommandConfig {
    pub fn with_args<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.expectation.args_matcher = Some(Box::new(matcher));
        self
    }

    fn output_mut(&mut self) -> &mut ProcessOutput {
        if !matches!(self.expectation.response, MockResponse::Output(_)) {
            self.expectation.response = MockResponse::Output(success_output());
        }
        match &mut self.expectation.response {
            MockResponse::Output(output) => output,
            MockResponse::NotFound => unreachable!("response was just reset to an output"),
        }
    }

    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.output_mut().stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.output_mut().stderr = stderr.to_string();
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        self.output_mut().status = if code == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Error(code)
        };
        self
    }

    pub fn returns_success(mut self) -> Self {
        self.output_mut().status = ExitStatus::Success;
        self
    }

    /// Simulate a program that is not installed
    pub fn returns_not_found(mut self) -> Self {
        self.expectation.response = MockResponse::NotFound;
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        self.expectation.expected_times = Some(n);
        self
    }

    pub fn finish(self) {
        self.runner
            .expectations
            .lock()
            .unwrap()
            .push(self.expectation);
    }
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}
