#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ledgerlink_session::{Session, SessionConfig};
use ledgerlink_transport::{memory_transport, MemoryConnection, MemoryRemote};
use serde_json::{json, Value};

pub const LEDGER_PUSH: &str = r#"{
    "type": "ledgerClosed",
    "fee_base": 10,
    "ledger_hash": "687F604EF6B2F67319E8DCC8C66EF49D84D18A1E18F948421FC24D2C7C3DB464",
    "ledger_index": 7125358,
    "ledger_time": 455751310,
    "reserve_base": 20000000,
    "reserve_inc": 5000000
}"#;

/// Open a session over the in-memory transport and accept its first
/// connection.
pub async fn open(config: SessionConfig) -> (Session, MemoryRemote, MemoryConnection) {
    let (connector, mut remote) = memory_transport();
    let session = Session::open_with_connector(Arc::new(connector), config)
        .await
        .expect("session should open");
    let conn = remote.accept().await.expect("remote should accept a dial");
    (session, remote, conn)
}

/// Next request envelope the client sent.
pub async fn next_request(conn: &mut MemoryConnection) -> Value {
    let text = conn.recv_text().await.expect("client should send a request");
    serde_json::from_str(&text).expect("request should be JSON")
}

pub fn reply(conn: &MemoryConnection, id: &Value, result: Value) {
    let frame = json!({"id": id, "status": "success", "type": "response", "result": result});
    assert!(conn.send_text(frame.to_string()), "client should be connected");
}

pub fn reply_error(conn: &MemoryConnection, id: &Value, error: &str) {
    let frame = json!({"id": id, "status": "error", "type": "response", "error": error});
    assert!(conn.send_text(frame.to_string()), "client should be connected");
}

/// Let every runnable task make progress. Under a paused clock this also
/// advances time by a millisecond once everything is idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
