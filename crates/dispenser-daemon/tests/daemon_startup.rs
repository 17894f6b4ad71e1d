use std::process::Command;

use tempfile::TempDir;

fn run_daemon(args: &[&str], envs: &[(&str, &str)]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dispenser-daemon"));
    cmd.args(args);
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("daemon process should launch")
}

#[test]
fn rejects_unparseable_listen_address() {
    let temp = TempDir::new().expect("tmp");
    let catalog = temp.path().join("territories.json");
    std::fs::write(&catalog, "[]").expect("write catalog");

    let output = run_daemon(
        &[
            "--listen",
            "not-an-address",
            "--catalog",
            catalog.to_str().expect("utf8"),
        ],
        &[],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid listen address"));
}

#[test]
fn listen_address_from_env_is_validated() {
    let output = run_daemon(&[], &[("DISPENSER_LISTEN", "also-not-an-address")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid listen address"));
}

#[test]
fn help_lists_flags() {
    let output = run_daemon(&["--help"], &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--listen"));
    assert!(stdout.contains("--catalog"));
}
