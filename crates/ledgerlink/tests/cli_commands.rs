#![cfg(feature = "cli")]

use std::process::{Command, Output};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

fn ledgerlink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ledgerlink"))
        .args(args)
        .env_remove("LEDGERLINK_ENDPOINT")
        .output()
        .expect("binary should run")
}

/// Serve one connection, answering each request with `result`.
async fn fake_node(result: Value) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have an address");

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("node should accept");
        let mut ws = tokio_tungstenite::accept_async(tcp)
            .await
            .expect("websocket handshake should succeed");
        while let Some(Ok(message)) = ws.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let request: Value = serde_json::from_str(&text).expect("request should be JSON");
            let reply = json!({
                "id": request["id"],
                "status": "success",
                "type": "response",
                "result": result,
            });
            if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                break;
            }
        }
    });

    format!("ws://{addr}")
}

#[test]
fn version_prints_package_version() {
    let out = ledgerlink(&["version"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with(&format!("ledgerlink {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn non_websocket_endpoint_is_usage_error() {
    let out = ledgerlink(&["fee", "--endpoint", "http://127.0.0.1:5005"]);
    assert_eq!(out.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&out.stderr).contains("connect failed"));
}

#[test]
fn refused_connection_fails_without_retry() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let port = listener.local_addr().expect("listener should have an address").port();
    drop(listener);

    let endpoint = format!("ws://127.0.0.1:{port}");
    let out = ledgerlink(&["fee", "--endpoint", &endpoint]);
    assert_eq!(out.status.code(), Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn fee_against_fake_node() {
    let endpoint = fake_node(json!({
        "current_ledger_size": "14",
        "current_queue_size": "0",
        "drops": {
            "base_fee": "10",
            "median_fee": "5000",
            "minimum_fee": "10",
            "open_ledger_fee": "10"
        },
        "expected_ledger_size": "24",
        "ledger_current_index": 26575101,
        "levels": {},
        "max_queue_size": "480"
    }))
    .await;

    let out = tokio::task::spawn_blocking(move || {
        ledgerlink(&["fee", "--endpoint", &endpoint, "--format", "json"])
    })
    .await
    .expect("cli task should finish");

    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let printed: Value =
        serde_json::from_slice(&out.stdout).expect("stdout should be one JSON document");
    assert_eq!(printed["drops"]["median_fee"], "5000");
    assert_eq!(printed["ledger_current_index"], 26575101);
}

#[tokio::test(flavor = "multi_thread")]
async fn raw_request_prints_result() {
    let endpoint = fake_node(json!({"info": {"build_version": "2.3.0"}})).await;

    let out = tokio::task::spawn_blocking(move || {
        ledgerlink(&[
            "request",
            "server_info",
            "--params",
            "{}",
            "--endpoint",
            &endpoint,
            "--format",
            "json",
        ])
    })
    .await
    .expect("cli task should finish");

    assert!(out.status.success());
    let printed: Value = serde_json::from_slice(&out.stdout).expect("stdout should be JSON");
    assert_eq!(printed["info"]["build_version"], "2.3.0");
}
