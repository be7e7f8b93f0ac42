//! Integration test: drive the `bootstrap-init` binary end to end.
//!
//! Covers the startup contract as seen from a container command line:
//! provisioning, idempotence, collision handling and the hand-off to the
//! entry point (which replaces the bootstrap process).

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Unprivileged uid/gid used when the suite runs as root.
const NOBODY: u32 = 65534;

/// Build a `bootstrap-init` command with a clean bootstrap environment.
fn bootstrap() -> Command {
    bootstrap_at(Path::new(env!("CARGO_BIN_EXE_bootstrap-init")))
}

fn bootstrap_at(program: &Path) -> Command {
    let mut cmd = Command::new(program);
    for var in [
        "BOOTSTRAP_ROOT",
        "BOOTSTRAP_ENTRYPOINT",
        "BOOTSTRAP_CONFIG",
        "BOOTSTRAP_LOG_FORMAT",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

fn set_mode(path: &Path, mode: u32) {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

/// Sandbox for permission tests.
///
/// Root passes every `access(2)` check, so as root the binary is copied
/// into a world-readable directory and run as `nobody`; `app/` is then
/// owned by `nobody`. Otherwise the binary runs as the current user.
struct Unprivileged {
    dir: TempDir,
    program: PathBuf,
}

impl Unprivileged {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut program = PathBuf::from(env!("CARGO_BIN_EXE_bootstrap-init"));
        if running_as_root() {
            set_mode(dir.path(), 0o755);
            let copy = dir.path().join("bootstrap-init");
            fs::copy(&program, &copy).unwrap();
            set_mode(&copy, 0o755);
            program = copy;
        }
        Self { dir, program }
    }

    /// Working root writable by the user the binary runs as.
    fn app_root(&self) -> PathBuf {
        let root = self.dir.path().join("app");
        fs::create_dir(&root).unwrap();
        if running_as_root() {
            std::os::unix::fs::chown(&root, Some(NOBODY), Some(NOBODY)).unwrap();
        }
        root
    }

    /// Directory the binary's user cannot write.
    fn read_only_dir(&self, path: &Path) {
        fs::create_dir(path).unwrap();
        set_mode(path, 0o555);
    }

    fn command(&self) -> Command {
        let mut cmd = bootstrap_at(&self.program);
        cmd.current_dir(self.dir.path());
        if running_as_root() {
            cmd.uid(NOBODY).gid(NOBODY);
        }
        cmd
    }
}

fn run_in(root: &Path, args: &[&str]) -> Output {
    bootstrap()
        .args(args)
        .arg("--root")
        .arg(root)
        .output()
        .expect("failed to run bootstrap-init")
}

fn sorted_entries(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_provision_empty_root() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_in(temp_dir.path(), &["provision"]);

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(sorted_entries(temp_dir.path()), vec!["config", "logs", "storage"]);
}

#[test]
fn test_provision_twice_is_noop() {
    let temp_dir = TempDir::new().unwrap();

    assert!(run_in(temp_dir.path(), &["provision"]).status.success());
    let output = run_in(temp_dir.path(), &["provision"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().all(|l| l.starts_with("existing")), "{}", stdout);
    assert_eq!(sorted_entries(temp_dir.path()), vec!["config", "logs", "storage"]);
}

#[test]
fn test_run_hands_off_in_root() {
    let temp_dir = TempDir::new().unwrap();

    let output = bootstrap()
        .args(["run", "--root"])
        .arg(temp_dir.path())
        .args(["--", "/bin/sh", "-c", "test -d logs && test -d storage && test -d config && touch started"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{:?}", output);
    assert!(temp_dir.path().join("started").exists());
}

#[test]
fn test_run_exit_status_is_entrypoint_status() {
    let temp_dir = TempDir::new().unwrap();

    let output = bootstrap()
        .args(["run", "--root"])
        .arg(temp_dir.path())
        .args(["--", "/bin/sh", "-c", "exit 7"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(7));
}

#[test]
fn test_run_entrypoint_from_env() {
    let temp_dir = TempDir::new().unwrap();

    let output = bootstrap()
        .env("BOOTSTRAP_ROOT", temp_dir.path())
        .env("BOOTSTRAP_ENTRYPOINT", "/bin/sh -c true")
        .arg("run")
        .output()
        .unwrap();

    assert!(output.status.success(), "{:?}", output);
    assert!(temp_dir.path().join("logs").is_dir());
}

#[test]
fn test_run_entrypoint_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("app");
    fs::create_dir(&root).unwrap();
    let config = temp_dir.path().join("bootstrap.yaml");
    fs::write(
        &config,
        format!(
            "root: {}\nentrypoint:\n  program: /bin/sh\n  args: [\"-c\", \"touch from-config\"]\n",
            root.display()
        ),
    )
    .unwrap();

    let output = bootstrap()
        .args(["run", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success(), "{:?}", output);
    assert!(root.join("from-config").exists());
    assert!(root.join("storage").is_dir());
}

#[test]
fn test_run_collision_never_starts_entrypoint() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("logs"), "occupied").unwrap();

    let output = bootstrap()
        .args(["run", "--root"])
        .arg(temp_dir.path())
        .args(["--", "/bin/sh", "-c", "touch started"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(73));
    assert!(!temp_dir.path().join("started").exists());
    assert!(temp_dir.path().join("logs").is_file());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a directory"), "{}", stderr);
}

#[test]
fn test_run_existing_storage_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let storage = temp_dir.path().join("storage");
    fs::create_dir(&storage).unwrap();
    fs::write(storage.join("keep.db"), "data").unwrap();

    let output = bootstrap()
        .args(["run", "--root"])
        .arg(temp_dir.path())
        .args(["--", "/bin/sh", "-c", "true"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(fs::read_to_string(storage.join("keep.db")).unwrap(), "data");
    assert_eq!(sorted_entries(temp_dir.path()), vec!["config", "logs", "storage"]);
}

#[test]
fn test_run_missing_program() {
    let temp_dir = TempDir::new().unwrap();

    let output = bootstrap()
        .args(["run", "--root"])
        .arg(temp_dir.path())
        .args(["--", "/nonexistent/entrypoint"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(127));
}

#[test]
fn test_run_without_entrypoint_is_config_error() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_in(temp_dir.path(), &["run"]);

    assert_eq!(output.status.code(), Some(78));
    assert!(sorted_entries(temp_dir.path()).is_empty());
}

#[test]
fn test_missing_root_fails() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("absent");

    let output = run_in(&root, &["provision"]);

    assert_eq!(output.status.code(), Some(73));
    assert!(!root.exists());
}

#[test]
fn test_check_reports_json() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("config")).unwrap();

    let output = run_in(temp_dir.path(), &["check", "--json"]);

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let states: Vec<&str> = report["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["missing", "missing", "existing"]);
    assert_eq!(sorted_entries(temp_dir.path()), vec!["config"]);
}

#[test]
fn test_json_logs_on_stderr() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_in(temp_dir.path(), &["provision", "--log-format", "json"]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let first = stderr.lines().next().expect("expected log output");
    let line: serde_json::Value = serde_json::from_str(first).unwrap();
    assert!(line.get("level").is_some());
}

#[test]
fn test_read_only_root_creates_nothing() {
    let sandbox = Unprivileged::new();
    let root = sandbox.dir.path().join("ro");
    sandbox.read_only_dir(&root);

    let output = sandbox
        .command()
        .args(["run", "--root"])
        .arg(&root)
        .args(["--", "/bin/sh", "-c", "true"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(73), "{:?}", output);
    assert!(sorted_entries(&root).is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("working root"), "{}", stderr);
    set_mode(&root, 0o755);
}

#[test]
fn test_existing_read_only_dir_fails() {
    let sandbox = Unprivileged::new();
    let root = sandbox.app_root();
    let storage = root.join("storage");
    sandbox.read_only_dir(&storage);

    let output = sandbox
        .command()
        .args(["run", "--root"])
        .arg(&root)
        .args(["--", "/bin/sh", "-c", "touch started"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(73), "{:?}", output);
    assert!(!root.join("started").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is not writable"), "{}", stderr);
    set_mode(&storage, 0o755);
}

#[test]
fn test_check_reports_read_only_dir() {
    let sandbox = Unprivileged::new();
    let root = sandbox.app_root();
    fs::create_dir(root.join("logs")).unwrap();
    if running_as_root() {
        std::os::unix::fs::chown(root.join("logs"), Some(NOBODY), Some(NOBODY)).unwrap();
    }
    sandbox.read_only_dir(&root.join("config"));

    let output = sandbox
        .command()
        .args(["check", "--json", "--root"])
        .arg(&root)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(73), "{:?}", output);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let states: Vec<&str> = report["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["existing", "missing", "not-writable"]);
    set_mode(&root.join("config"), 0o755);
}
