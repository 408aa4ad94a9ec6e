use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The built binary with logging silenced and no settings leaking in from the caller.
fn notifier() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_notifier"));
    for var in [
        "NOTIFIER_URL",
        "NOTIFIER_INTERVAL",
        "NOTIFIER_WORKERS",
        "NOTIFIER_TIMEOUT",
        "NOTIFIER_MAX_LINE_LENGTH",
        "NOTIFIER_LOG_LEVEL",
        "NOTIFIER_CONFIG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    cmd
}

/// Write `input` to the child's stdin, close it, and collect the exit status and stdout.
async fn feed(mut cmd: Command, input: &[u8]) -> (ExitStatus, String) {
    let mut child = cmd.spawn().unwrap();
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(input).await.unwrap();
    drop(stdin);

    let output = child.wait_with_output().await.unwrap();
    (output.status, String::from_utf8(output.stdout).unwrap())
}

#[tokio::test]
async fn test_exits_zero_after_draining_with_env_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let mut cmd = notifier();
    cmd.env("NOTIFIER_URL", format!("{}/alerts", server.uri()))
        .env("NOTIFIER_INTERVAL", "0")
        .env("NOTIFIER_WORKERS", "2");

    let (status, _) = feed(cmd, b"disk full\nload high\n").await;
    assert_eq!(status.code(), Some(0));
}

#[tokio::test]
async fn test_flags_take_precedence_over_env() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/from-flag"))
        .and(body_string("ping"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = notifier();
    cmd.env("NOTIFIER_URL", format!("{}/from-env", server.uri()))
        .env("NOTIFIER_INTERVAL", "0")
        .arg("--url")
        .arg(format!("{}/from-flag", server.uri()));

    let (status, _) = feed(cmd, b"ping\n").await;
    assert_eq!(status.code(), Some(0));
}

#[tokio::test]
async fn test_echo_prints_only_submitted_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut cmd = notifier();
    cmd.args(["--url", &server.uri(), "--interval", "0", "--echo"]);

    let (status, stdout) = feed(cmd, b"first\n\nsecond\n").await;
    assert_eq!(status.code(), Some(0));
    assert_eq!(stdout, "first\nsecond\n");
}

#[tokio::test]
async fn test_exits_one_on_oversized_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut cmd = notifier();
    cmd.args(["--url", &server.uri(), "--interval", "0", "--max-line-length", "4"]);

    let (status, _) = feed(cmd, b"ok\nway past the limit\n").await;
    assert_eq!(status.code(), Some(1));
}

#[tokio::test]
async fn test_exits_one_on_invalid_url() {
    let mut cmd = notifier();
    cmd.env("NOTIFIER_URL", "localhost:8080");

    let (status, _) = feed(cmd, b"").await;
    assert_eq!(status.code(), Some(1));
}
