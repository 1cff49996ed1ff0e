//! Print every closed ledger reported by a node until Ctrl-C.
//!
//! Run: `cargo run --example follow-ledgers -- ws://127.0.0.1:6006`

use ledgerlink::frame::StreamMessage;
use ledgerlink::session::{Session, Streams};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:6006".to_string());

    let mut session = Session::open(&endpoint, true).await?;
    let snapshot = session
        .client()
        .subscribe(Streams {
            ledger: true,
            ..Streams::default()
        })
        .await?;
    println!("subscribed at ledger {:?}", snapshot.ledger_index);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            message = session.recv() => match message {
                Some(StreamMessage::LedgerClosed(ledger)) => println!(
                    "ledger {} closed ({} transactions)",
                    ledger.ledger_index,
                    ledger.txn_count.unwrap_or(0)
                ),
                Some(other) => println!("{} message", other.kind()),
                None => break,
            },
        }
    }

    session.close().await;
    Ok(())
}
