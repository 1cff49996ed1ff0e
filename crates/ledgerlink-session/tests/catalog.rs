mod common;

use std::time::Duration;

use futures_util::StreamExt;
use ledgerlink_session::{LedgerSpec, SessionConfig, SessionError, Streams};
use serde_json::json;

use common::{next_request, open, reply, reply_error};

#[tokio::test]
async fn account_lines_walks_every_page_on_one_ledger() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let client = session.client().clone();
    let call = tokio::spawn(async move {
        client
            .account_lines("rAccount", &LedgerSpec::Validated)
            .await
    });

    let line = |peer: &str, currency: &str| {
        json!({"account": peer, "balance": "1", "currency": currency, "limit": "10", "limit_peer": "0"})
    };

    let first = next_request(&mut conn).await;
    assert_eq!(first["command"], "account_lines");
    assert_eq!(first["ledger_index"], "validated");
    assert_eq!(first["limit"], 400);
    assert!(first.get("marker").is_none());
    reply(
        &conn,
        &first["id"],
        json!({"ledger_index": 100, "marker": "M1", "lines": [line("rB", "USD")]}),
    );

    let second = next_request(&mut conn).await;
    assert_eq!(second["ledger_index"], 100);
    assert_eq!(second["marker"], "M1");
    reply(
        &conn,
        &second["id"],
        json!({"ledger_index": 100, "marker": "M2", "lines": [line("rC", "EUR")]}),
    );

    let third = next_request(&mut conn).await;
    assert_eq!(third["marker"], "M2");
    reply(
        &conn,
        &third["id"],
        json!({"ledger_index": 100, "lines": [line("rD", "BTC")]}),
    );

    let lines = call
        .await
        .expect("call task should finish")
        .expect("pagination should succeed");
    let currencies: Vec<&str> = lines.iter().map(|l| l.currency.as_str()).collect();
    assert_eq!(currencies, vec!["BTC", "EUR", "USD"]);

    // Exactly three requests: nothing follows the page without a marker.
    assert!(
        tokio::time::timeout(Duration::from_millis(50), conn.recv_text())
            .await
            .is_err()
    );
    session.close().await;
}

#[tokio::test]
async fn failed_page_ends_collection() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let client = session.client().clone();
    let call = tokio::spawn(async move {
        client
            .account_offers("rAccount", &LedgerSpec::Current)
            .await
    });

    let first = next_request(&mut conn).await;
    reply(
        &conn,
        &first["id"],
        json!({"marker": "M1", "offers": [
            {"flags": 0, "seq": 9, "taker_gets": "100", "taker_pays": "1"}
        ]}),
    );
    let second = next_request(&mut conn).await;
    reply_error(&conn, &second["id"], "lgrNotFound");

    let err = call
        .await
        .expect("call task should finish")
        .expect_err("second page should fail");
    assert!(matches!(err, SessionError::Remote(ref remote) if remote.error == "lgrNotFound"));
    session.close().await;
}

#[tokio::test]
async fn account_offers_are_sorted_by_sequence() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let client = session.client().clone();
    let call = tokio::spawn(async move {
        client
            .account_offers("rAccount", &LedgerSpec::Validated)
            .await
    });

    let request = next_request(&mut conn).await;
    reply(
        &conn,
        &request["id"],
        json!({"offers": [
            {"flags": 0, "seq": 12, "taker_gets": "100", "taker_pays": "1"},
            {"flags": 0, "seq": 3, "taker_gets": "5", "taker_pays": "2"}
        ]}),
    );

    let offers = call
        .await
        .expect("call task should finish")
        .expect("offers should load");
    let seqs: Vec<u32> = offers.iter().map(|o| o.seq).collect();
    assert_eq!(seqs, vec![3, 12]);
    session.close().await;
}

#[tokio::test]
async fn account_tx_streams_items_across_pages() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let mut stream = session.client().account_tx("rAccount", 2, -1, -1);

    let first = next_request(&mut conn).await;
    assert_eq!(first["command"], "account_tx");
    assert_eq!(first["ledger_index_min"], -1);
    assert_eq!(first["forward"], true);
    reply(
        &conn,
        &first["id"],
        json!({
            "marker": {"ledger": 5, "seq": 1},
            "transactions": [
                {"tx": {"Sequence": 1}, "meta": {}, "validated": true},
                {"tx": {"Sequence": 2}, "meta": {}, "validated": true}
            ]
        }),
    );

    let item = stream
        .next()
        .await
        .expect("stream should yield")
        .expect("item should be ok");
    assert_eq!(item.tx["Sequence"], 1);

    let second = next_request(&mut conn).await;
    assert_eq!(second["marker"], json!({"ledger": 5, "seq": 1}));
    reply(
        &conn,
        &second["id"],
        json!({"transactions": [{"tx": {"Sequence": 3}, "meta": {}, "validated": true}]}),
    );

    let mut sequences = vec![1];
    while let Some(item) = stream.next().await {
        let item = item.expect("item should be ok");
        sequences.push(item.tx["Sequence"].as_u64().expect("sequence should be a number"));
    }
    assert_eq!(sequences, vec![1, 2, 3]);
    session.close().await;
}

#[tokio::test]
async fn stream_ledger_data_yields_pages_then_error() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let mut pages = session.client().stream_ledger_data(LedgerSpec::Index(77));

    let first = next_request(&mut conn).await;
    assert_eq!(first["binary"], true);
    assert_eq!(first["ledger_index"], 77);
    reply(
        &conn,
        &first["id"],
        json!({"ledger_index": "77", "marker": "AB", "state": [{"index": "01", "data": "1100"}]}),
    );
    let page = pages
        .recv()
        .await
        .expect("stream should yield")
        .expect("page should be ok");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].data.as_deref(), Some("1100"));

    let second = next_request(&mut conn).await;
    assert_eq!(second["marker"], "AB");
    reply_error(&conn, &second["id"], "lgrNotFound");
    assert!(matches!(
        pages.recv().await,
        Some(Err(SessionError::Remote(_)))
    ));
    assert!(pages.recv().await.is_none());
    session.close().await;
}

#[tokio::test]
async fn submit_batch_collects_outcomes_in_order() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let client = session.client().clone();
    let blobs = vec!["AA".to_string(), "BB".to_string()];
    let call = tokio::spawn(async move { client.submit_batch(&blobs).await });

    let first = next_request(&mut conn).await;
    let second = next_request(&mut conn).await;
    assert_eq!(first["tx_blob"], "AA");
    assert_eq!(second["tx_blob"], "BB");

    reply_error(&conn, &second["id"], "invalidTransaction");
    reply(
        &conn,
        &first["id"],
        json!({"engine_result": "tesSUCCESS", "engine_result_code": 0, "tx_json": {}}),
    );

    let results = call.await.expect("batch task should finish");
    assert_eq!(results.len(), 2);
    let accepted = results[0].as_ref().expect("first submit should succeed");
    assert!(accepted.is_accepted());
    assert!(matches!(results[1], Err(SessionError::Remote(_))));
    session.close().await;
}

#[tokio::test]
async fn subscribe_requires_requested_snapshots() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let client = session.client().clone();
    let streams = Streams {
        ledger: true,
        server: true,
        ..Streams::default()
    };
    let call = tokio::spawn(async move { client.subscribe(streams).await });

    let request = next_request(&mut conn).await;
    assert_eq!(request["streams"], json!(["ledger", "server"]));
    reply(&conn, &request["id"], json!({"ledger_index": 5, "ledger_hash": "AB"}));

    let err = call
        .await
        .expect("call task should finish")
        .expect_err("missing server snapshot should fail");
    assert!(matches!(err, SessionError::Protocol(_)));
    session.close().await;
}

#[tokio::test]
async fn fee_decodes_typed_result() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let client = session.client().clone();
    let call = tokio::spawn(async move { client.fee().await });

    let request = next_request(&mut conn).await;
    assert_eq!(request, json!({"id": request["id"], "command": "fee"}));
    reply(
        &conn,
        &request["id"],
        json!({
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
        }),
    );

    let fee = call
        .await
        .expect("call task should finish")
        .expect("fee should decode");
    assert_eq!(fee.drops.median_fee, "5000");
    assert_eq!(fee.ledger_current_index, Some(26575101));
    session.close().await;
}

#[tokio::test]
async fn close_returns_while_a_full_page_stream_is_unread() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let mut stream = session.client().account_tx("rAccount", 64, -1, -1);

    let first = next_request(&mut conn).await;
    let transactions: Vec<_> = (0..64)
        .map(|seq| json!({"tx": {"Sequence": seq}, "meta": {}, "validated": true}))
        .collect();
    reply(
        &conn,
        &first["id"],
        json!({"marker": {"ledger": 5, "seq": 64}, "transactions": transactions}),
    );

    // The second page is in flight while every buffered item sits unread.
    let second = next_request(&mut conn).await;
    assert_eq!(second["marker"], json!({"ledger": 5, "seq": 64}));

    tokio::time::timeout(Duration::from_secs(5), session.close())
        .await
        .expect("close should not wait on an unread page stream");

    let mut delivered = 0;
    while let Some(item) = stream.recv().await {
        item.expect("buffered items should be intact");
        delivered += 1;
    }
    assert_eq!(delivered, 64);
}

#[tokio::test]
async fn ledger_expands_and_orders_transactions() {
    let (session, _remote, mut conn) = open(SessionConfig::default()).await;
    let client = session.client().clone();
    let call = tokio::spawn(async move { client.ledger(&LedgerSpec::Index(9), true).await });

    let request = next_request(&mut conn).await;
    assert_eq!(request["command"], "ledger");
    assert_eq!(request["transactions"], true);
    assert_eq!(request["expand"], true);
    assert_eq!(request["ledger_index"], 9);
    reply(
        &conn,
        &request["id"],
        json!({
            "ledger_index": 9,
            "validated": true,
            "ledger": {"transactions": [
                {"hash": "B", "metaData": {"TransactionIndex": 1}},
                {"hash": "A", "metaData": {"TransactionIndex": 0}}
            ]}
        }),
    );

    let ledger = call
        .await
        .expect("call task should finish")
        .expect("ledger should load");
    assert_eq!(ledger.ledger["transactions"][0]["hash"], "A");
    assert_eq!(ledger.ledger["transactions"][1]["hash"], "B");
    session.close().await;
}
