use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create tempdir"),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("studytrack").expect("binary");
        cmd.env("STUDYTRACK_HOME", self.dir.path());
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self.cmd().args(&a).output().expect("run");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn run_err(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], false, "expected success=false: {v}");
        v
    }

    /// Point the config at a port nothing listens on, so network calls
    /// fail fast instead of hanging.
    fn init_unreachable(&self) {
        let v = self.run_json(&["init", "--api-url", "http://127.0.0.1:1/api"]);
        assert_eq!(v["success"], true, "init failed: {v}");
    }
}

// ─── tests ─────────────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    TestEnv::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("task"))
        .stdout(predicate::str::contains("goal"))
        .stdout(predicate::str::contains("summary"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn version_flag_works() {
    TestEnv::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("studytrack"));
}

#[test]
fn commands_fail_cleanly_before_init() {
    let env = TestEnv::new();
    let v = env.run_err(&["task", "list"]);
    assert_eq!(v["error"]["code"], "NOT_CONFIGURED");

    env.cmd()
        .args(["task", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn init_writes_config_and_reports_path() {
    let env = TestEnv::new();
    let v = env.run_json(&["init", "--api-url", "http://127.0.0.1:1/api"]);
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["api_url"], "http://127.0.0.1:1/api");
    assert!(env.dir.path().join("config.json").exists());
}

#[test]
fn commands_require_sign_in_after_init() {
    let env = TestEnv::new();
    env.init_unreachable();
    let v = env.run_err(&["goal", "show"]);
    assert_eq!(v["error"]["code"], "NOT_SIGNED_IN");
}

#[test]
fn whoami_without_session_reports_not_signed_in() {
    let env = TestEnv::new();
    env.init_unreachable();
    let v = env.run_err(&["whoami"]);
    assert_eq!(v["error"]["code"], "NOT_SIGNED_IN");
}

#[test]
fn login_against_unreachable_backend_is_a_network_error() {
    let env = TestEnv::new();
    env.init_unreachable();
    let v = env.run_err(&["login", "a@b.c", "secret"]);
    assert_eq!(v["error"]["code"], "NETWORK");
}
