use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn busan() -> assert_cmd::Command {
    cargo_bin_cmd!("busan")
}

fn service_dir(dockerfile: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Dockerfile"), dockerfile).unwrap();
    tmp
}

// ── Help / Version ──

#[test]
fn shows_help() {
    busan()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("DOCKERFILE_DIRECTORY"))
        .stdout(predicate::str::contains("--docker-host"))
        .stdout(predicate::str::contains("--name"));
}

#[test]
fn shows_version() {
    busan()
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains("busan"));
}

#[test]
fn requires_directory() {
    busan().assert().failure();
}

// ── Local checks ──

#[test]
fn missing_directory_fails_with_message() {
    let tmp = TempDir::new().unwrap();

    busan()
        .arg(tmp.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: "))
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn directory_without_dockerfile_fails() {
    let tmp = TempDir::new().unwrap();

    busan()
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dockerfile"));
}

#[test]
fn dockerfile_without_version_fails() {
    let tmp = service_dir("FROM alpine:3\n");

    busan()
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("VERSION"));
}

#[test]
fn invalid_name_override_fails() {
    let tmp = service_dir("# VERSION 1.0\nFROM alpine:3\n");

    busan()
        .arg(tmp.path())
        .args(["--name", "web:latest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("web:latest"));
}

// ── Daemon address ──

#[test]
fn unsupported_daemon_address_fails() {
    let tmp = service_dir("# VERSION 1.0\nFROM alpine:3\n");

    busan()
        .arg(tmp.path())
        .args(["-d", "ftp://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported daemon address"));
}

#[test]
fn unreachable_daemon_fails() {
    let tmp = service_dir("# VERSION 1.0\nFROM alpine:3\n");

    busan()
        .arg(tmp.path())
        .args(["--docker-host", "tcp://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to connect to daemon"));
}
