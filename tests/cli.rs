use assert_cmd::Command;
use predicates::prelude::*;

fn pdfchat() -> Command {
    let mut cmd = Command::cargo_bin("pdfchat").unwrap();
    cmd.env_remove("PDFCHAT_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_options() {
    pdfchat()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--upload"))
        .stdout(predicate::str::contains("--ask"))
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--no-poll"));
}

#[test]
fn version_is_printed() {
    pdfchat()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn ask_without_upload_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    std::fs::write(&settings, r#"{"scroll_delay_ms": 0}"#).unwrap();

    pdfchat()
        .args(["--config", settings.to_str().unwrap()])
        .args(["--url", "http://127.0.0.1:9", "--ask", "What is this?"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Please upload PDF before asking a question.",
        ));
}

#[test]
fn invalid_url_is_rejected() {
    pdfchat()
        .args(["--url", "ftp://example.com", "--ask", "q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url must start with http"));
}

#[test]
fn missing_config_file_is_reported() {
    pdfchat()
        .args(["--config", "/nonexistent/pdfchat.json", "--ask", "q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load settings"));
}
