//! End-to-end orchestrator scenarios driven through the session file loader
//! with a mock process runner

mod common;

use common::{locator, strings, TestProject, SCENARIO_FILE};
use noxide::error::ErrorCode;
use noxide::orchestrator::{OrchestratorConfig, OrchestratorOutcome};
use noxide::session::RunStatus;
use noxide::subprocess::MockProcessRunner;

fn signatures(outcome: &OrchestratorOutcome) -> Vec<String> {
    outcome.results.iter().map(|r| r.signature.clone()).collect()
}

fn failure_code(status: &RunStatus) -> Option<u16> {
    match status {
        RunStatus::Failed { code, .. } => Some(*code),
        _ => None,
    }
}

#[tokio::test]
async fn test_empty_selection_runs_default_sessions() {
    let project = TestProject::new(SCENARIO_FILE);
    let mock = MockProcessRunner::new();
    mock.allow_unexpected();
    let orchestrator = project
        .orchestrator(project.config(), locator(&["3.10", "3.11"]), &mock)
        .await;

    let outcome = orchestrator.run(&[]).await.unwrap();

    assert_eq!(signatures(&outcome), vec!["lint", "tests-3.10", "tests-3.11"]);
    assert!(outcome.results.iter().all(|r| r.succeeded()));
    assert!(outcome.success());
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(mock.calls_to("pre-commit").len(), 1);
    assert_eq!(mock.calls_to("pytest").len(), 2);
    assert!(mock.calls_to("sphinx-build").is_empty());
}

#[tokio::test]
async fn test_one_failure_does_not_stop_other_runs() {
    let project = TestProject::new(SCENARIO_FILE);
    let mut mock = MockProcessRunner::new();
    mock.expect_command("pre-commit")
        .returns_exit_code(1)
        .returns_stdout("trailing-whitespace....Failed\n")
        .finish();
    mock.allow_unexpected();
    let orchestrator = project
        .orchestrator(project.config(), locator(&["3.10", "3.11"]), &mock)
        .await;

    let outcome = orchestrator.run(&[]).await.unwrap();

    assert_eq!(outcome.results.len(), 3);
    assert_eq!(
        failure_code(&outcome.results[0].status),
        Some(ErrorCode::EXEC_COMMAND_FAILED)
    );
    assert!(outcome.results[1].succeeded());
    assert!(outcome.results[2].succeeded());
    assert!(!outcome.success());
    assert_ne!(outcome.exit_code(), 0);
}

#[tokio::test]
async fn test_docs_serve_with_linkcheck_is_argument_error() {
    let project = TestProject::new(SCENARIO_FILE);
    let mock = MockProcessRunner::new();
    mock.allow_unexpected();
    let config = OrchestratorConfig {
        posargs: strings(&["--serve", "-b", "linkcheck"]),
        ..project.config()
    };
    let orchestrator = project
        .orchestrator(config, locator(&["3.10", "3.11"]), &mock)
        .await;

    let outcome = orchestrator.run(&strings(&["docs"])).await.unwrap();

    assert_eq!(signatures(&outcome), vec!["docs"]);
    assert_eq!(
        failure_code(&outcome.results[0].status),
        Some(ErrorCode::SESSION_INVALID_ARGUMENTS)
    );
    assert_ne!(outcome.exit_code(), 0);
    assert!(mock.calls_to("sphinx-build").is_empty());
    assert!(mock.calls_to("pre-commit").is_empty());
    assert!(mock.calls_to("pytest").is_empty());
}

#[tokio::test]
async fn test_docs_builder_flows_into_command() {
    let project = TestProject::new(SCENARIO_FILE);
    let mock = MockProcessRunner::new();
    mock.allow_unexpected();
    let config = OrchestratorConfig {
        posargs: strings(&["-b", "linkcheck", "-W"]),
        ..project.config()
    };
    let orchestrator = project.orchestrator(config, locator(&[]), &mock).await;

    let outcome = orchestrator.run(&strings(&["docs"])).await.unwrap();

    assert!(outcome.success());
    let call = &mock.calls_to("sphinx-build")[0];
    assert_eq!(
        call.args,
        strings(&["-b", "linkcheck", "source", "_build/linkcheck", "-W"])
    );
}

const MISSING_INTERPRETER_FILE: &str = r#"
[[session]]
name = "tests"
python = ["3.8", "3.11"]
steps = [{ run = ["pytest"] }]
"#;

#[tokio::test]
async fn test_strict_mode_fails_missing_interpreter() {
    let project = TestProject::new(MISSING_INTERPRETER_FILE);
    let mock = MockProcessRunner::new();
    mock.allow_unexpected();
    let config = OrchestratorConfig {
        error_on_missing_interpreters: true,
        ..project.config()
    };
    let orchestrator = project.orchestrator(config, locator(&["3.11"]), &mock).await;

    let outcome = orchestrator.run(&[]).await.unwrap();

    assert_eq!(signatures(&outcome), vec!["tests-3.8", "tests-3.11"]);
    assert_eq!(
        failure_code(&outcome.results[0].status),
        Some(ErrorCode::ENV_MISSING_INTERPRETER)
    );
    assert!(outcome.results[1].succeeded());
    assert_ne!(outcome.exit_code(), 0);
}

#[tokio::test]
async fn test_lenient_mode_skips_missing_interpreter() {
    let project = TestProject::new(MISSING_INTERPRETER_FILE);
    let mock = MockProcessRunner::new();
    mock.allow_unexpected();
    let orchestrator = project
        .orchestrator(project.config(), locator(&["3.11"]), &mock)
        .await;

    let outcome = orchestrator.run(&[]).await.unwrap();

    assert!(matches!(outcome.results[0].status, RunStatus::Skipped { .. }));
    assert!(outcome.results[1].succeeded());
    assert_eq!(outcome.count("skipped"), 1);
    assert!(outcome.success());
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(mock.calls_to("pytest").len(), 1);
}

#[tokio::test]
async fn test_install_failure_keeps_installer_output() {
    let project = TestProject::new(SCENARIO_FILE);
    let mut mock = MockProcessRunner::new();
    mock.expect_command("python")
        .with_args(|args| args.iter().any(|a| a == "pre-commit"))
        .returns_exit_code(1)
        .returns_stderr("ERROR: Could not find a version that satisfies pre-commit\n")
        .finish();
    mock.allow_unexpected();
    let orchestrator = project
        .orchestrator(project.config(), locator(&["3.10", "3.11"]), &mock)
        .await;

    let outcome = orchestrator.run(&strings(&["lint", "tests-3.10"])).await.unwrap();

    match &outcome.results[0].status {
        RunStatus::Failed { reason, code } => {
            assert_eq!(*code, ErrorCode::EXEC_INSTALL_FAILED);
            assert!(reason.contains("Could not find a version"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(mock.calls_to("pre-commit").is_empty());
    assert!(outcome.results[1].succeeded());
}

#[tokio::test]
async fn test_missing_tool_is_spawn_failure() {
    let project = TestProject::new(SCENARIO_FILE);
    let mut mock = MockProcessRunner::new();
    mock.expect_command("pytest").returns_not_found().finish();
    mock.allow_unexpected();
    let orchestrator = project
        .orchestrator(project.config(), locator(&["3.10"]), &mock)
        .await;

    let outcome = orchestrator.run(&strings(&["tests-3.10"])).await.unwrap();

    assert_eq!(
        failure_code(&outcome.results[0].status),
        Some(ErrorCode::EXEC_SPAWN_FAILED)
    );
    assert_eq!(outcome.results[0].exit_code, 127);
}

#[tokio::test]
async fn test_persistent_reuse_across_process_runs() {
    let project = TestProject::new(SCENARIO_FILE);
    let mock = MockProcessRunner::new();
    mock.allow_unexpected();
    let config = OrchestratorConfig {
        reuse_existing_virtualenvs: true,
        no_install: true,
        ..project.config()
    };

    let first = project
        .orchestrator(config.clone(), locator(&[]), &mock)
        .await;
    first.run(&strings(&["lint"])).await.unwrap();
    assert_eq!(mock.calls_to("python3").len(), 1);
    assert_eq!(mock.calls_to("python").len(), 1);

    let second = project.orchestrator(config, locator(&[]), &mock).await;
    let outcome = second.run(&strings(&["lint"])).await.unwrap();

    assert!(outcome.success());
    assert_eq!(mock.calls_to("python3").len(), 1);
    assert_eq!(mock.calls_to("python").len(), 1);
    assert_eq!(mock.calls_to("pre-commit").len(), 2);
    assert!(project.path().join(".noxide/lint/noxide-env.json").is_file());
}

#[tokio::test]
async fn test_environments_are_recreated_without_persistence() {
    let project = TestProject::new(SCENARIO_FILE);
    let mock = MockProcessRunner::new();
    mock.allow_unexpected();

    for _ in 0..2 {
        let orchestrator = project
            .orchestrator(project.config(), locator(&[]), &mock)
            .await;
        orchestrator.run(&strings(&["lint"])).await.unwrap();
    }

    assert_eq!(mock.calls_to("python3").len(), 2);
    assert!(!project.path().join(".noxide/lint/noxide-env.json").exists());
}
