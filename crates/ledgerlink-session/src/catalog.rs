//! Typed commands.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::client::Client;
use crate::error::{Result, SessionError};
use crate::paginate::{collect_pages, stream_pages, Cursor, Marker, PageStream};
use crate::request::Command;
use crate::types::{
    sort_trust_lines, AccountInfoResult, AccountLinesPage, AccountOffer, AccountOffersPage,
    AccountTransaction, AccountTxPage, BookOffersResult, FeeResult, LedgerDataPage,
    LedgerHeaderResult, LedgerResult, LedgerSpec, OrderBook, PathFindResult, StateEntry, Streams,
    SubmitResult, SubscribeResult, TrustLine, TxResult,
};

/// Page size for `account_lines` and `account_offers`.
const ACCOUNT_PAGE_LIMIT: u32 = 400;
/// Offers requested per `book_offers` call.
const BOOK_OFFERS_LIMIT: u32 = 5000;

#[derive(Serialize)]
struct BookSubscription<'a> {
    streams: [&'static str; 2],
    books: &'a [OrderBook],
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Params for one page of an account-scoped paginated query.
///
/// The ledger selector of the first page is replaced by the index that page
/// was served from, so later pages read the same ledger.
fn account_page_params(
    account: &str,
    ledger: &LedgerSpec,
    limit: u32,
    cursor: &Cursor,
) -> Map<String, Value> {
    let mut params = object(json!({ "account": account, "limit": limit }));
    match cursor.ledger_index {
        Some(index) => LedgerSpec::Index(index).apply(&mut params),
        None => ledger.apply(&mut params),
    }
    if let Some(Marker(marker)) = &cursor.marker {
        let _ = params.insert("marker".to_string(), marker.clone());
    }
    params
}

impl Client {
    /// Look up a transaction by hash.
    pub async fn tx(&self, hash: &str) -> Result<TxResult> {
        self.call("tx", &json!({ "transaction": hash, "binary": false }))
            .await
    }

    /// Submit a signed, hex-encoded transaction blob.
    pub async fn submit(&self, tx_blob: &str) -> Result<SubmitResult> {
        self.call("submit", &json!({ "tx_blob": tx_blob })).await
    }

    /// Submit several blobs without waiting in between, then collect every
    /// outcome in submission order.
    pub async fn submit_batch(&self, tx_blobs: &[String]) -> Vec<Result<SubmitResult>> {
        let mut queued = Vec::with_capacity(tx_blobs.len());
        for blob in tx_blobs {
            let entry = match Command::<SubmitResult>::new("submit", &json!({ "tx_blob": blob })) {
                Ok((command, pending)) => match self.submit_request(Box::new(command)).await {
                    Ok(()) => Ok(pending),
                    Err(err) => Err(err),
                },
                Err(err) => Err(err),
            };
            queued.push(entry);
        }

        let mut results = Vec::with_capacity(queued.len());
        for entry in queued {
            results.push(match entry {
                Ok(pending) => pending.wait().await,
                Err(err) => Err(err),
            });
        }
        results
    }

    /// Fetch a ledger, optionally with its transactions. Transactions are
    /// always expanded and come back in ledger order.
    pub async fn ledger(&self, ledger: &LedgerSpec, transactions: bool) -> Result<LedgerResult> {
        let mut params = object(json!({ "transactions": transactions, "expand": true }));
        ledger.apply(&mut params);
        let mut result: LedgerResult = self.call("ledger", &params).await?;
        result.sort_transactions();
        Ok(result)
    }

    /// Fetch the binary ledger header.
    pub async fn ledger_header(&self, ledger: &LedgerSpec) -> Result<LedgerHeaderResult> {
        let mut params = Map::new();
        ledger.apply(&mut params);
        self.call("ledger_header", &params).await
    }

    /// Fetch one page of ledger state.
    pub async fn ledger_data(
        &self,
        ledger: &LedgerSpec,
        marker: Option<&Marker>,
    ) -> Result<LedgerDataPage> {
        let mut params = object(json!({ "binary": true }));
        ledger.apply(&mut params);
        if let Some(Marker(marker)) = marker {
            let _ = params.insert("marker".to_string(), marker.clone());
        }
        self.call("ledger_data", &params).await
    }

    /// Walk the whole state of a ledger, one page of binary entries per item.
    pub fn stream_ledger_data(&self, ledger: LedgerSpec) -> PageStream<Vec<StateEntry>> {
        stream_pages::<LedgerDataPage, _, _>(self, "ledger_data", move |cursor| {
            let mut params = object(json!({ "binary": true }));
            match cursor.ledger_index {
                Some(index) => LedgerSpec::Index(index).apply(&mut params),
                None => ledger.apply(&mut params),
            }
            if let Some(Marker(marker)) = &cursor.marker {
                let _ = params.insert("marker".to_string(), marker.clone());
            }
            params
        })
    }

    /// Fetch the `AccountRoot` of an account.
    pub async fn account_info(
        &self,
        account: &str,
        ledger: &LedgerSpec,
    ) -> Result<AccountInfoResult> {
        let mut params = object(json!({ "account": account, "strict": true }));
        ledger.apply(&mut params);
        self.call("account_info", &params).await
    }

    /// Every trust line of an account, sorted by currency.
    pub async fn account_lines(&self, account: &str, ledger: &LedgerSpec) -> Result<Vec<TrustLine>> {
        let mut lines = collect_pages::<AccountLinesPage, _, _>(self, "account_lines", |cursor| {
            account_page_params(account, ledger, ACCOUNT_PAGE_LIMIT, cursor)
        })
        .await?;
        sort_trust_lines(&mut lines);
        Ok(lines)
    }

    /// Every offer owned by an account, sorted by sequence.
    pub async fn account_offers(
        &self,
        account: &str,
        ledger: &LedgerSpec,
    ) -> Result<Vec<AccountOffer>> {
        let mut offers =
            collect_pages::<AccountOffersPage, _, _>(self, "account_offers", |cursor| {
                account_page_params(account, ledger, ACCOUNT_PAGE_LIMIT, cursor)
            })
            .await?;
        offers.sort_by_key(|offer| offer.seq);
        Ok(offers)
    }

    /// Transactions affecting an account within a ledger range, oldest first.
    ///
    /// `-1` for either bound means the earliest / latest available ledger.
    pub fn account_tx(
        &self,
        account: &str,
        page_size: u32,
        min_ledger: i64,
        max_ledger: i64,
    ) -> PageStream<AccountTransaction> {
        let account = account.to_string();
        stream_pages::<AccountTxPage, _, _>(self, "account_tx", move |cursor| {
            let mut params = object(json!({
                "account": account,
                "ledger_index_min": min_ledger,
                "ledger_index_max": max_ledger,
                "limit": page_size,
                "forward": true,
            }));
            if let Some(Marker(marker)) = &cursor.marker {
                let _ = params.insert("marker".to_string(), marker.clone());
            }
            params
        })
    }

    /// Offers in one order book.
    pub async fn book_offers(
        &self,
        taker: &str,
        ledger: &LedgerSpec,
        taker_pays: &Value,
        taker_gets: &Value,
    ) -> Result<BookOffersResult> {
        let mut params = object(json!({
            "taker": taker,
            "taker_pays": taker_pays,
            "taker_gets": taker_gets,
            "limit": BOOK_OFFERS_LIMIT,
        }));
        ledger.apply(&mut params);
        self.call("book_offers", &params).await
    }

    /// One-shot path search.
    pub async fn ripple_path_find(
        &self,
        source: &str,
        destination: &str,
        amount: &Value,
        source_currencies: Option<&[Value]>,
    ) -> Result<PathFindResult> {
        let mut params = object(json!({
            "source_account": source,
            "destination_account": destination,
            "destination_amount": amount,
        }));
        if let Some(currencies) = source_currencies {
            let _ = params.insert("source_currencies".to_string(), Value::from(currencies.to_vec()));
        }
        self.call("ripple_path_find", &params).await
    }

    /// Subscribe to streams. Pushes arrive through
    /// [`Session::recv`](crate::Session::recv).
    ///
    /// The reply must carry the ledger snapshot when the ledger stream is
    /// requested, and the server snapshot when the server stream is.
    pub async fn subscribe(&self, streams: Streams) -> Result<SubscribeResult> {
        let result: SubscribeResult = self
            .call("subscribe", &json!({ "streams": streams.names() }))
            .await?;
        if streams.ledger && result.ledger_index.is_none() {
            return Err(SessionError::Protocol(
                "subscribe reply is missing the ledger snapshot".to_string(),
            ));
        }
        if streams.server && result.server_status.is_none() {
            return Err(SessionError::Protocol(
                "subscribe reply is missing the server snapshot".to_string(),
            ));
        }
        Ok(result)
    }

    /// Follow order books, along with the ledger and server streams.
    pub async fn subscribe_order_books(&self, books: &[OrderBook]) -> Result<SubscribeResult> {
        let params = BookSubscription {
            streams: ["ledger", "server"],
            books,
        };
        self.call("subscribe", &params).await
    }

    /// Current transaction cost and queue state.
    pub async fn fee(&self) -> Result<FeeResult> {
        self.call("fee", &()).await
    }
}
