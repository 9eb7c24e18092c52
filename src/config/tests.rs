use super::*;
use crate::error::NoxideError;
use crate::platform::Platform;
use crate::session::{SessionBody, SessionRegistry};
use crate::testing::{RecordedCall, RecordingContext};
use crate::venv::VenvBackend;

const DEMO: &str = include_str!("../../demos/noxide.toml");

fn demo_registry() -> SessionRegistry {
    SessionFile::from_toml(DEMO).unwrap().into_registry().unwrap()
}

async fn run_demo(session: &str, ctx: &mut RecordingContext) -> crate::error::Result<()> {
    let registry = demo_registry();
    let body = registry.lookup(session).unwrap().body.clone();
    body.run(ctx).await
}

fn strings(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_demo_file_registers_all_sessions() {
    let registry = demo_registry();

    assert_eq!(
        registry.names(),
        vec!["lint", "pylint", "tests", "min_qiskit_version", "docs"]
    );
    let defaults: Vec<_> = registry
        .list_default_sessions()
        .iter()
        .map(|s| s.name.clone())
        .collect();
    assert_eq!(defaults, vec!["lint", "pylint", "tests"]);

    let tests = registry.lookup("tests").unwrap();
    assert!(tests.reuse_env);
    assert_eq!(tests.interpreter_versions.len(), 5);
    assert_eq!(
        registry.lookup("lint").unwrap().description.as_deref(),
        Some("Lint the Python part of the codebase using pre-commit.")
    );
}

#[tokio::test]
async fn test_lint_forwards_posargs() {
    let mut ctx = RecordingContext::new("lint").with_posargs(["--hook-stage", "manual"]);
    run_demo("lint", &mut ctx).await.unwrap();

    assert_eq!(ctx.installs(), vec![strings(&["pre-commit"])]);
    assert_eq!(
        ctx.runs(),
        vec![strings(&["pre-commit", "run", "--all-files", "--hook-stage", "manual"])]
    );
}

#[tokio::test]
async fn test_tests_session_without_coverage() {
    let mut ctx = RecordingContext::new("tests-3.10").with_python("3.10");
    run_demo("tests", &mut ctx).await.unwrap();

    assert_eq!(
        ctx.installs(),
        vec![
            strings(&["scikit-build-core[pyproject]", "setuptools_scm", "pybind11"]),
            strings(&["--no-build-isolation", "-ve.[test]"]),
        ]
    );
    assert_eq!(
        ctx.runs(),
        vec![strings(&["pip", "show", "qiskit-terra"]), strings(&["pytest"])]
    );
    for call in ctx.calls() {
        match call {
            RecordedCall::Run { argv, env, .. } if argv[0] == "pip" => {
                assert!(env.is_empty(), "pip show got {env:?}");
            }
            RecordedCall::Install { env, .. } | RecordedCall::Run { env, .. } => {
                assert_eq!(env["PIP_DISABLE_PIP_VERSION_CHECK"], "1");
                assert!(!env.contains_key("CMAKE_ARGS"));
            }
            RecordedCall::Chdir(_) => {}
        }
    }
}

#[tokio::test]
async fn test_tests_session_with_coverage_on_windows() {
    let mut ctx = RecordingContext::new("tests-3.12")
        .with_python("3.12")
        .with_platform(Platform::Windows)
        .with_posargs(["--cov", "-x"]);
    run_demo("tests", &mut ctx).await.unwrap();

    assert_eq!(
        ctx.installs()[1],
        strings(&["--no-build-isolation", "-ve.[coverage]"])
    );
    assert_eq!(
        ctx.runs()[1],
        strings(&["pytest", "--cov", "-x", "--cov-config=pyproject.toml"])
    );
    for call in ctx.calls() {
        match call {
            RecordedCall::Run { argv, env, .. } if argv[0] == "pip" => {
                assert!(!env.contains_key("CMAKE_ARGS"));
                assert!(!env.contains_key("PIP_DISABLE_PIP_VERSION_CHECK"));
            }
            RecordedCall::Install { env, .. } | RecordedCall::Run { env, .. } => {
                assert_eq!(env["CMAKE_ARGS"], "-T ClangCl");
                assert_eq!(env["PIP_DISABLE_PIP_VERSION_CHECK"], "1");
            }
            RecordedCall::Chdir(_) => {}
        }
    }
}

#[tokio::test]
async fn test_docs_default_html_build() {
    let mut ctx = RecordingContext::new("docs").with_posargs(["-W"]);
    run_demo("docs", &mut ctx).await.unwrap();

    assert_eq!(ctx.installs().len(), 2);
    assert!(ctx.calls().contains(&RecordedCall::Chdir("docs".into())));
    assert_eq!(
        ctx.runs(),
        vec![strings(&[
            "sphinx-build",
            "--keep-going",
            "-n",
            "-T",
            "-b=html",
            "source",
            "_build/html",
            "-W",
        ])]
    );
}

#[tokio::test]
async fn test_docs_serve_installs_autobuild() {
    let mut ctx = RecordingContext::new("docs").with_posargs(["--serve"]);
    run_demo("docs", &mut ctx).await.unwrap();

    assert!(ctx.installs().contains(&strings(&["sphinx-autobuild"])));
    assert_eq!(ctx.runs()[0][0], "sphinx-autobuild");
    assert_eq!(ctx.runs()[0][3], "-b=html");
}

#[tokio::test]
async fn test_docs_linkcheck_stops_early() {
    let mut ctx = RecordingContext::new("docs").with_posargs(["-b", "linkcheck"]);
    run_demo("docs", &mut ctx).await.unwrap();

    assert_eq!(
        ctx.runs(),
        vec![strings(&["sphinx-build", "-b", "linkcheck", "source", "_build/linkcheck"])]
    );
}

#[tokio::test]
async fn test_docs_serve_with_other_builder_aborts() {
    let mut ctx = RecordingContext::new("docs").with_posargs(["--serve", "-b", "linkcheck"]);
    let err = run_demo("docs", &mut ctx).await.unwrap_err();

    assert!(matches!(err, NoxideError::Argument { .. }));
    assert!(err
        .to_string()
        .contains("Must not specify non-HTML builder with --serve"));
    assert!(ctx.calls().is_empty());
}

#[tokio::test]
async fn test_error_step_aborts_through_context() {
    let file = SessionFile::from_toml(
        r#"
        [[session]]
        name = "release"

        [[session.steps]]
        error = "Releases are built on CI only ({python})"
        when = { no_flag = "--force" }

        [[session.steps]]
        run = ["twine", "upload", "dist/*"]
        "#,
    )
    .unwrap();
    let registry = file.into_registry().unwrap();
    let body = registry.lookup("release").unwrap().body.clone();

    let mut ctx = RecordingContext::new("release").with_python("3.12");
    let err = body.run(&mut ctx).await.unwrap_err();
    assert!(matches!(err, NoxideError::SessionAborted { .. }));
    assert_eq!(err.to_string(), "Releases are built on CI only (3.12)");
    assert!(ctx.runs().is_empty());

    let mut ctx = RecordingContext::new("release").with_posargs(["--force"]);
    body.run(&mut ctx).await.unwrap();
    assert_eq!(ctx.runs().len(), 1);
}

#[tokio::test]
async fn test_failing_command_stops_session() {
    let mut ctx = RecordingContext::new("min_qiskit_version").failing("pip", 1);
    let err = run_demo("min_qiskit_version", &mut ctx).await.unwrap_err();

    assert!(matches!(err, NoxideError::CommandFailed { exit_code: 1, .. }));
    assert_eq!(ctx.runs(), vec![strings(&["pip", "show", "qiskit-terra"])]);
}

#[tokio::test]
async fn test_structured_argument_errors_fail_the_body() {
    let file = SessionFile::from_toml(
        r#"
        [[session]]
        name = "docs"
        args = { mode = "structured", options = [{ name = "serve", kind = "switch" }] }
        steps = [{ run = ["sphinx-build", "{posargs}"] }]
        "#,
    )
    .unwrap();
    let registry = file.into_registry().unwrap();
    let body = registry.lookup("docs").unwrap().body.clone();

    let mut ctx = RecordingContext::new("docs").with_posargs(["--open"]);
    let err = body.run(&mut ctx).await.unwrap_err();
    assert!(matches!(err, NoxideError::Argument { .. }));
    assert!(ctx.calls().is_empty());
}

#[tokio::test]
async fn test_envdir_and_python_placeholders() {
    let body = DeclarativeSession::new(
        Default::default(),
        vec![Step::new(StepAction::Run(strings(&[
            "python{python}",
            "--prefix={envdir}",
        ])))],
    );
    let mut ctx = RecordingContext::new("build-3.11").with_python("3.11");
    body.run(&mut ctx).await.unwrap();
    assert_eq!(
        ctx.runs(),
        vec![strings(&["python3.11", "--prefix=.noxide/build-3.11"])]
    );

    let mut ctx = RecordingContext::new("build").without_isolation();
    assert!(body.run(&mut ctx).await.is_err());
}

#[tokio::test]
async fn test_set_env_and_platform_env_scopes() {
    let file = SessionFile::from_toml(
        r#"
[[session]]
name = "build"

[[session.steps]]
run = ["cmake", "--version"]
env = { VERBOSE = "1" }
platform_env = [
    { platform = "windows", env = { CMAKE_GENERATOR = "Ninja" } },
    { platform = "unix", env = { CC = "clang" } },
]

[[session.steps]]
set_env = { PROFILE = "release" }

[[session.steps]]
run = ["make"]
"#,
    )
    .unwrap();
    let registry = file.into_registry().unwrap();
    let body = registry.lookup("build").unwrap().body.clone();

    let mut ctx = RecordingContext::new("build");
    body.run(&mut ctx).await.unwrap();
    let envs: Vec<_> = ctx
        .calls()
        .iter()
        .filter_map(|call| match call {
            RecordedCall::Run { env, .. } => Some(env.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(envs[0].get("CC").map(String::as_str), Some("clang"));
    assert_eq!(envs[0].get("VERBOSE").map(String::as_str), Some("1"));
    assert!(!envs[0].contains_key("CMAKE_GENERATOR"));
    assert!(!envs[0].contains_key("PROFILE"));
    assert_eq!(envs[1].len(), 1);
    assert_eq!(envs[1]["PROFILE"], "release");

    let mut ctx = RecordingContext::new("build").with_platform(Platform::Windows);
    body.run(&mut ctx).await.unwrap();
    match &ctx.calls()[0] {
        RecordedCall::Run { env, .. } => {
            assert_eq!(env["CMAKE_GENERATOR"], "Ninja");
            assert!(!env.contains_key("CC"));
        }
        other => panic!("unexpected first call: {other:?}"),
    }
}

#[test]
fn test_duplicate_session_names_fail_at_load() {
    let file = SessionFile::from_toml(
        r#"
        [[session]]
        name = "lint"

        [[session]]
        name = "lint"
        "#,
    )
    .unwrap();

    let err = file.into_registry().unwrap_err();
    assert!(matches!(err, NoxideError::DuplicateSession { ref name } if name == "lint"));
    assert!(err.is_configuration());
}

#[test]
fn test_options_sessions_must_exist() {
    let err = SessionFile::from_toml(
        r#"
        [options]
        sessions = ["lint", "typecheck"]

        [[session]]
        name = "lint"
        "#,
    )
    .unwrap_err();

    assert!(matches!(err, NoxideError::UnknownSession { ref name, .. } if name == "typecheck"));
}

#[test]
fn test_invalid_conditions_rejected() {
    let cases = [
        (
            r#"[[session]]
            name = "a"
            steps = [{ run = ["x"], when = { switch = "serve" } }]"#,
            "needs structured args",
        ),
        (
            r#"[[session]]
            name = "a"
            args = { mode = "structured", options = [{ name = "b", kind = "value" }] }
            steps = [{ run = ["x"], when = { switch = "b" } }]"#,
            "takes a value",
        ),
        (
            r#"[[session]]
            name = "a"
            steps = [{ run = ["x"], when = { equals = "html" } }]"#,
            "need an `option`",
        ),
        (
            r#"[[session]]
            name = "a"
            steps = [{ run = [] }]"#,
            "run needs a program",
        ),
        (
            r#"[[session]]
            name = "a"
            conflicts = [{ when = { option = "builder", equals = "x" }, message = "m" }]"#,
            "conflict 1",
        ),
    ];

    for (content, expected) in cases {
        let err = SessionFile::from_toml(content).unwrap_err();
        assert!(err.is_configuration(), "{content}");
        assert!(err.to_string().contains(expected), "{err} / {expected}");
    }
}

#[test]
fn test_unknown_keys_rejected() {
    let err = SessionFile::from_toml(
        r#"
        [[session]]
        name = "lint"
        reuse = true
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, NoxideError::Config { .. }));
}

#[test]
fn test_yaml_session_file() {
    let file = SessionFile::from_yaml(
        r#"
options:
  error_on_missing_interpreters: true
  venv_backend: virtualenv
session:
  - name: tests
    python: ["3.10", "3.11"]
    steps:
      - install: ["-ve.[test]"]
      - run: ["pytest", "{posargs}"]
        silent: true
"#,
    )
    .unwrap();

    assert_eq!(file.options.error_on_missing_interpreters, Some(true));
    assert_eq!(file.options.venv_backend, Some(VenvBackend::Virtualenv));
    let steps = &file.sessions[0].steps;
    assert_eq!(steps[0].action, StepAction::Install(strings(&["-ve.[test]"])));
    assert!(steps[1].silent);
}

#[tokio::test]
async fn test_load_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noxide.toml");
    std::fs::write(&path, "[[session]]\nname = 3\n").unwrap();

    let err = SessionFile::load(&path).await.unwrap_err();
    assert!(err.user_message().contains("noxide.toml"));

    let missing = SessionFile::load(&dir.path().join("absent.toml")).await.unwrap_err();
    assert!(matches!(missing, NoxideError::Config { path: Some(_), .. }));

    std::fs::write(dir.path().join("noxide.yml"), "session:\n  - name: lint\n").unwrap();
    let file = SessionFile::load(&dir.path().join("noxide.yml")).await.unwrap();
    assert_eq!(file.sessions[0].name, "lint");
}
