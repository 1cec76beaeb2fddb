use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;

fn lab_cli() -> assert_cmd::Command {
    cargo_bin_cmd!("lab-cli").into()
}

fn write_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let config_path = dir.path().join("config.toml");
    let mut f = std::fs::File::create(&config_path).unwrap();
    write!(f, "{contents}").unwrap();
    config_path
}

#[test]
fn help_works() {
    lab_cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("grouped for Ansible"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("inventory"));
}

#[test]
fn subcommand_required() {
    lab_cli().assert().failure();
}

#[test]
fn unknown_subcommand_rejected() {
    lab_cli()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("frobnicate"));
}

#[test]
fn missing_config_shows_error() {
    lab_cli()
        .args(["--config", "/nonexistent/lab-cli/config.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn default_config_location_follows_xdg() {
    let dir = tempfile::tempdir().unwrap();
    lab_cli()
        .env("XDG_CONFIG_HOME", dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"))
        .stderr(predicate::str::contains("config.toml"));
}

#[test]
fn malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, "[network\nname = ");

    lab_cli()
        .args(["--config", config_path.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn reversed_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        &dir,
        r#"
[network]
range_start = "192.168.100.200"
range_end = "192.168.100.10"
"#,
    );

    lab_cli()
        .args(["--config", config_path.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation error"));
}

#[test]
fn invalid_address_in_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        &dir,
        r#"
[network]
address = "192.168.100"
"#,
    );

    lab_cli()
        .args(["--config", config_path.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("network.address"));
}

#[test]
fn create_rejects_bad_name_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, "ansible_public_key = \"ssh-ed25519 AAAA ops@lab\"\n");

    lab_cli()
        .args(["--config", config_path.to_str().unwrap(), "create", "a/b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("VM name must match"));
}

#[test]
fn create_rejects_bad_group() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, "ansible_public_key = \"ssh-ed25519 AAAA ops@lab\"\n");

    lab_cli()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "create",
            "web1",
            "--groups",
            "web,a:b",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not contain"));
}

#[test]
fn create_rejects_reserved_group() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, "ansible_public_key = \"ssh-ed25519 AAAA ops@lab\"\n");

    lab_cli()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "create",
            "web1",
            "--groups",
            "_meta",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reserved"));
}

#[test]
fn create_rejects_unknown_distro() {
    lab_cli()
        .args(["create", "web1", "--distro", "arch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("arch"));
}

#[test]
fn start_requires_name() {
    lab_cli()
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<NAME>"));
}
