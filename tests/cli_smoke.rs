use predicates::prelude::*;
use serde_json::json;

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("counseling");
    cmd.env_remove("COUNSELING_API_URL");
    cmd.env_remove("COUNSELING_NOTES_API_URL");
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn missing_api_url_exits_3() {
    cmd()
        .args(["counselors", "list"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("config_missing"));
}

#[test]
fn create_with_non_object_data_exits_2() {
    cmd()
        .args([
            "--api-url",
            "http://127.0.0.1:9",
            "counselors",
            "create",
            "--data",
            "[1,2,3]",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid_args"));
}

#[test]
fn note_file_without_multipart_exits_2() {
    cmd()
        .args([
            "--api-url",
            "http://127.0.0.1:9",
            "notes",
            "create",
            "--file",
            "attachment=./missing.pdf",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--file requires --multipart"));
}

#[tokio::test]
async fn counselors_list_prints_state() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/counselors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "a", "name": "Dana" }
        ])))
        .mount(&server)
        .await;

    let output = cmd()
        .env("COUNSELING_API_URL", format!("{}/api/counselors", server.uri()))
        .args(["counselors", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let state: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(state["items"], json!([{ "_id": "a", "name": "Dana" }]));
    assert_eq!(state["loading"], json!(false));
    assert_eq!(state["error"], json!(null));
}

#[tokio::test]
async fn notes_create_failure_prints_error_and_exits_4() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createSession"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "msg": "bad" })))
        .mount(&server)
        .await;

    let assert = cmd()
        .args([
            "--notes-api-url",
            &server.uri(),
            "notes",
            "create",
            "--field",
            "summary=ok",
        ])
        .assert()
        .failure()
        .code(4);

    let state: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(state["error"], json!({ "msg": "bad" }));
    assert_eq!(state["success_message"], json!(""));
}
