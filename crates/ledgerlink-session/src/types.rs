//! Typed results of the command catalog.
//!
//! Only the fields callers routinely need are typed; everything else is kept
//! in a flattened `extra` map or as raw JSON.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::paginate::{Marker, Page};

/// Which ledger a query reads from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LedgerSpec {
    /// Most recent validated ledger.
    #[default]
    Validated,
    /// Most recent closed ledger.
    Closed,
    /// The open ledger.
    Current,
    /// A ledger by sequence number.
    Index(u64),
    /// A ledger by hash.
    Hash(String),
}

impl LedgerSpec {
    /// Insert the selector fields into a params object.
    pub fn apply(&self, params: &mut Map<String, Value>) {
        let (key, value) = match self {
            LedgerSpec::Validated => ("ledger_index", Value::from("validated")),
            LedgerSpec::Closed => ("ledger_index", Value::from("closed")),
            LedgerSpec::Current => ("ledger_index", Value::from("current")),
            LedgerSpec::Index(index) => ("ledger_index", Value::from(*index)),
            LedgerSpec::Hash(hash) => ("ledger_hash", Value::from(hash.as_str())),
        };
        let _ = params.insert(key.to_string(), value);
    }
}

/// Ledger indexes appear as numbers or decimal strings depending on the
/// command and node version.
pub(crate) fn flexible_index<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Index {
        Number(u64),
        Text(String),
    }

    match Option::<Index>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Index::Number(index)) => Ok(Some(index)),
        Some(Index::Text(text)) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// `tx` result.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TxResult {
    pub hash: String,
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_index: Option<u64>,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub meta: Option<Value>,
    /// Transaction fields (`Account`, `TransactionType`, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// `submit` result.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SubmitResult {
    pub engine_result: String,
    pub engine_result_code: i64,
    #[serde(default)]
    pub engine_result_message: Option<String>,
    #[serde(default)]
    pub tx_blob: Option<String>,
    #[serde(default)]
    pub tx_json: Value,
}

impl SubmitResult {
    /// Check if the node applied or queued the transaction (`tes` / `ter`
    /// results).
    pub fn is_accepted(&self) -> bool {
        self.engine_result.starts_with("tes") || self.engine_result == "terQUEUED"
    }
}

/// `ledger` result.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LedgerResult {
    #[serde(default)]
    pub ledger_hash: Option<String>,
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_index: Option<u64>,
    #[serde(default)]
    pub validated: bool,
    /// Ledger header, plus `transactions` when requested.
    pub ledger: Value,
}

impl LedgerResult {
    /// Put expanded transactions in the order they were applied to the
    /// ledger (`metaData.TransactionIndex`). Entries without metadata, such
    /// as bare hashes, keep their relative order after the indexed ones.
    pub(crate) fn sort_transactions(&mut self) {
        let Some(transactions) = self
            .ledger
            .get_mut("transactions")
            .and_then(Value::as_array_mut)
        else {
            return;
        };
        transactions.sort_by_key(|tx| {
            let index = tx
                .get("metaData")
                .or_else(|| tx.get("meta"))
                .and_then(|meta| meta.get("TransactionIndex"))
                .and_then(Value::as_u64);
            (index.is_none(), index)
        });
    }
}

/// `ledger_header` result.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LedgerHeaderResult {
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_index: Option<u64>,
    /// Hex-encoded binary header.
    #[serde(default)]
    pub ledger_data: Option<String>,
    #[serde(default)]
    pub ledger: Value,
}

/// One ledger state entry. Binary queries fill `data`; JSON queries fill
/// `fields`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StateEntry {
    pub index: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// `ledger_data` result: one page of ledger state.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LedgerDataPage {
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_index: Option<u64>,
    #[serde(default)]
    pub ledger_hash: Option<String>,
    #[serde(default)]
    pub state: Vec<StateEntry>,
    #[serde(default)]
    pub marker: Option<Marker>,
}

impl Page for LedgerDataPage {
    /// A whole page of state per item.
    type Item = Vec<StateEntry>;

    fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    fn ledger_index(&self) -> Option<u64> {
        self.ledger_index
    }

    fn into_items(self) -> Vec<Self::Item> {
        vec![self.state]
    }
}

/// The `AccountRoot` ledger entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AccountRoot {
    pub account: String,
    /// Drops, as a decimal string.
    pub balance: String,
    pub sequence: u32,
    #[serde(default)]
    pub owner_count: u32,
    #[serde(default)]
    pub flags: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `account_info` result.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AccountInfoResult {
    pub account_data: AccountRoot,
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_index: Option<u64>,
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_current_index: Option<u64>,
    #[serde(default)]
    pub validated: bool,
}

/// A trust line from `account_lines`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TrustLine {
    /// Counterparty.
    pub account: String,
    pub balance: String,
    pub currency: String,
    pub limit: String,
    pub limit_peer: String,
    #[serde(default)]
    pub no_ripple: Option<bool>,
    #[serde(default)]
    pub freeze: Option<bool>,
}

impl TrustLine {
    fn balance_value(&self) -> f64 {
        self.balance.parse().unwrap_or(0.0)
    }
}

/// Sort by currency, then by balance (highest first), then counterparty.
pub(crate) fn sort_trust_lines(lines: &mut [TrustLine]) {
    lines.sort_by(|a, b| {
        a.currency
            .cmp(&b.currency)
            .then_with(|| b.balance_value().total_cmp(&a.balance_value()))
            .then_with(|| a.account.cmp(&b.account))
    });
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccountLinesPage {
    #[serde(default, deserialize_with = "flexible_index")]
    ledger_index: Option<u64>,
    #[serde(default)]
    marker: Option<Marker>,
    #[serde(default)]
    lines: Vec<TrustLine>,
}

impl Page for AccountLinesPage {
    type Item = TrustLine;

    fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    fn ledger_index(&self) -> Option<u64> {
        self.ledger_index
    }

    fn into_items(self) -> Vec<TrustLine> {
        self.lines
    }
}

/// An offer owned by the queried account.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AccountOffer {
    pub flags: u32,
    pub seq: u32,
    /// Amount: a drops string or an issued-currency object.
    pub taker_gets: Value,
    pub taker_pays: Value,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccountOffersPage {
    #[serde(default, deserialize_with = "flexible_index")]
    ledger_index: Option<u64>,
    #[serde(default)]
    marker: Option<Marker>,
    #[serde(default)]
    offers: Vec<AccountOffer>,
}

impl Page for AccountOffersPage {
    type Item = AccountOffer;

    fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    fn ledger_index(&self) -> Option<u64> {
        self.ledger_index
    }

    fn into_items(self) -> Vec<AccountOffer> {
        self.offers
    }
}

/// One entry of `account_tx`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AccountTransaction {
    pub tx: Value,
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub validated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccountTxPage {
    #[serde(default)]
    marker: Option<Marker>,
    #[serde(default)]
    transactions: Vec<AccountTransaction>,
}

impl Page for AccountTxPage {
    type Item = AccountTransaction;

    fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    fn into_items(self) -> Vec<AccountTransaction> {
        self.transactions
    }
}

/// `book_offers` result.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BookOffersResult {
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_index: Option<u64>,
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_current_index: Option<u64>,
    #[serde(default)]
    pub offers: Vec<Value>,
}

/// `ripple_path_find` result.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PathFindResult {
    #[serde(default)]
    pub alternatives: Vec<Value>,
    pub destination_account: String,
    #[serde(default)]
    pub destination_currencies: Vec<String>,
}

/// Streams requested by [`Client::subscribe`](crate::Client::subscribe).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streams {
    pub ledger: bool,
    pub transactions: bool,
    pub transactions_proposed: bool,
    pub server: bool,
}

impl Streams {
    /// Wire names of the selected streams.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.ledger {
            names.push("ledger");
        }
        if self.transactions {
            names.push("transactions");
        }
        if self.transactions_proposed {
            names.push("transactions_proposed");
        }
        if self.server {
            names.push("server");
        }
        names
    }
}

/// An order book to follow with `subscribe`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderBook {
    pub taker_gets: Value,
    pub taker_pays: Value,
    /// Send the current book state along with the subscription.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub snapshot: bool,
    /// Subscribe to both sides of the book.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub both: bool,
}

/// `subscribe` result: snapshots of the requested streams.
///
/// Ledger fields are present when the ledger stream was requested, server
/// fields when the server stream was.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SubscribeResult {
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_index: Option<u64>,
    #[serde(default)]
    pub ledger_hash: Option<String>,
    #[serde(default)]
    pub ledger_time: Option<u64>,
    #[serde(default)]
    pub fee_base: Option<u64>,
    #[serde(default)]
    pub reserve_base: Option<u64>,
    #[serde(default)]
    pub reserve_inc: Option<u64>,
    #[serde(default)]
    pub validated_ledgers: Option<String>,
    #[serde(default)]
    pub server_status: Option<String>,
    #[serde(default)]
    pub load_base: Option<u64>,
    #[serde(default)]
    pub load_factor: Option<u64>,
    /// Order book snapshots, when requested.
    #[serde(default)]
    pub offers: Vec<Value>,
}

/// Fee levels in drops, as decimal strings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeeDrops {
    pub base_fee: String,
    pub median_fee: String,
    pub minimum_fee: String,
    pub open_ledger_fee: String,
}

/// `fee` result.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FeeResult {
    pub current_ledger_size: String,
    pub current_queue_size: String,
    pub drops: FeeDrops,
    pub expected_ledger_size: String,
    #[serde(default, deserialize_with = "flexible_index")]
    pub ledger_current_index: Option<u64>,
    #[serde(default)]
    pub levels: Value,
    pub max_queue_size: String,
}
