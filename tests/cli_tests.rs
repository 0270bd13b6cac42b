// CLI behaviour through the compiled binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Binary running in an empty directory so no config or session leaks in
fn inspection_forms(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("inspection-forms").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("INSPECTION_FORMS_SESSION__PATH", dir.path().join("session.json"));
    cmd
}

#[test]
fn test_no_arguments_shows_getting_started() {
    let dir = TempDir::new().unwrap();
    inspection_forms(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("inspection-forms login"))
        .stdout(predicate::str::contains("inspection-forms list coating"));
}

#[test]
fn test_help_lists_lifecycle_commands() {
    let dir = TempDir::new().unwrap();
    let output = inspection_forms(&dir).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["login", "submit", "qa-submit", "qa-reject", "approve", "reject", "permissions"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

#[test]
fn test_permissions_lookup_works_offline() {
    let dir = TempDir::new().unwrap();
    inspection_forms(&dir)
        .args(["permissions", "coating", "--role", "operator", "--status", "REJECTED"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ canSubmit"))
        .stdout(predicate::str::contains("❌ canApprove"));

    inspection_forms(&dir)
        .args(["permissions", "printing", "--role", "master", "--status", "submitted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ canDownloadPdf"))
        .stdout(predicate::str::contains("❌ canSaveDraft"))
        .stdout(predicate::str::contains("read-only"));
}

#[test]
fn test_malformed_env_file_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".env"), "INSPECTION_FORMS_API__BASE_URL=\"http://unterminated\n").unwrap();
    inspection_forms(&dir)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read .env"));
}

#[test]
fn test_unknown_kind_is_rejected() {
    let dir = TempDir::new().unwrap();
    inspection_forms(&dir)
        .args(["permissions", "welding", "--role", "qa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown"));
}

#[test]
fn test_transition_requires_login() {
    let dir = TempDir::new().unwrap();
    inspection_forms(&dir)
        .args(["whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));

    inspection_forms(&dir)
        .args(["approve", "coating", "12"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 2, "name": "Alice", "role": "operator"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let uri = server.uri();
    let login = |dir: &TempDir| {
        let mut cmd = inspection_forms(dir);
        cmd.env("INSPECTION_FORMS_API__BASE_URL", &uri);
        cmd
    };

    login(&dir)
        .args(["login", "alice", "--password", "pw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice (operator)"));
    assert!(dir.path().join("session.json").exists());

    inspection_forms(&dir)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice (operator)"));

    inspection_forms(&dir)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_with_bad_password_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    inspection_forms(&dir)
        .env("INSPECTION_FORMS_API__BASE_URL", server.uri())
        .args(["login", "alice", "--password", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid credentials"));
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_users_lists_by_role() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 9, "name": "Mona", "role": "master"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/role/avp"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 5, "name": "Carol", "role": "avp"}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "name": "Alice", "role": "operator"},
            {"id": 5, "name": "Carol", "role": "avp"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let uri = server.uri();
    let with_backend = |dir: &TempDir| {
        let mut cmd = inspection_forms(dir);
        cmd.env("INSPECTION_FORMS_API__BASE_URL", &uri);
        cmd
    };

    with_backend(&dir)
        .args(["login", "mona", "--password", "pw"])
        .assert()
        .success();

    with_backend(&dir)
        .args(["users", "--role", "avp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Carol (avp)"))
        .stdout(predicate::str::contains("Alice").not());

    with_backend(&dir)
        .arg("users")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice (operator)"))
        .stdout(predicate::str::contains("Carol (avp)"));
}
