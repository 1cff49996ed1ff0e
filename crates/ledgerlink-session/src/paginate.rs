//! Marker-driven pagination.
//!
//! Every page is a fresh [`Command`] through the normal submission path; the
//! loop lives on the caller's side and never touches session internals.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::Client;
use crate::error::Result;
use crate::request::{Command, Pending};

/// Items buffered between a pagination helper and its consumer.
const PAGE_STREAM_CAPACITY: usize = 64;

/// Opaque continuation token returned by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(pub Value);

/// Position in a paginated query, handed to the params builder for each page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    /// Marker from the previous page; `None` for the first.
    pub marker: Option<Marker>,
    /// Ledger the first page was served from, once known.
    pub ledger_index: Option<u64>,
    /// Zero-based page number.
    pub page: usize,
}

/// One reply of a paginated command.
pub trait Page: DeserializeOwned + Send + 'static {
    type Item: Send + 'static;

    /// Continuation marker; `None` on the last page.
    fn marker(&self) -> Option<&Marker>;

    /// Ledger the page was served from.
    fn ledger_index(&self) -> Option<u64> {
        None
    }

    fn into_items(self) -> Vec<Self::Item>;
}

/// Fetch every page of `command` and concatenate the items in order.
///
/// `params` builds each page's request from the cursor. The first error ends
/// the fetch and is returned.
pub async fn collect_pages<P, Q, F>(client: &Client, command: &str, mut params: F) -> Result<Vec<P::Item>>
where
    P: Page,
    Q: Serialize,
    F: FnMut(&Cursor) -> Q,
{
    let mut items = Vec::new();
    let mut cursor = Cursor::default();
    loop {
        let page: P = client.call(command, &params(&cursor)).await?;
        if !advance(&mut cursor, &page) {
            items.extend(page.into_items());
            return Ok(items);
        }
        items.extend(page.into_items());
    }
}

/// Like [`collect_pages`], but items are yielded as pages arrive.
///
/// A helper task on the session fetches pages and feeds the returned stream.
/// A failed page is yielded as the final `Err` item. The stream ends when the
/// last page is consumed, the consumer drops it, or the session closes.
pub fn stream_pages<P, Q, F>(client: &Client, command: &str, mut params: F) -> PageStream<P::Item>
where
    P: Page,
    Q: Serialize + 'static,
    F: FnMut(&Cursor) -> Q + Send + 'static,
{
    let (tx, rx) = mpsc::channel(PAGE_STREAM_CAPACITY);
    let client = client.clone();
    let command = command.to_string();

    let helper = client.clone();
    helper.tracker().spawn(async move {
        let shutdown = client.shutdown().clone();
        let mut cursor = Cursor::default();
        loop {
            let built = Command::<P>::new(&command, &params(&cursor));
            let page = match fetch(&client, built).await {
                Ok(page) => page,
                Err(err) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => {}
                        _ = tx.send(Err(err)) => {}
                    }
                    return;
                }
            };
            let more = advance(&mut cursor, &page);
            for item in page.into_items() {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    sent = tx.send(Ok(item)) => {
                        if sent.is_err() {
                            debug!(command = %command, "page stream dropped by consumer");
                            return;
                        }
                    }
                }
            }
            if !more {
                return;
            }
        }
    });

    PageStream { rx }
}

async fn fetch<P: Page>(client: &Client, built: Result<(Command<P>, Pending<P>)>) -> Result<P> {
    let (command, pending) = built?;
    client.submit_request(Box::new(command)).await?;
    pending.wait().await
}

/// Move the cursor past `page`. Returns false when `page` was the last one.
fn advance<P: Page>(cursor: &mut Cursor, page: &P) -> bool {
    if cursor.ledger_index.is_none() {
        cursor.ledger_index = page.ledger_index();
    }
    cursor.page += 1;
    cursor.marker = page.marker().cloned();
    cursor.marker.is_some()
}

/// Items of a paginated fetch running in the background.
#[derive(Debug)]
pub struct PageStream<T> {
    rx: mpsc::Receiver<Result<T>>,
}

impl<T> PageStream<T> {
    /// Next item, or `None` when the fetch has finished.
    pub async fn recv(&mut self) -> Option<Result<T>> {
        self.rx.recv().await
    }

    /// Drain the stream into a vector, stopping at the first error.
    pub async fn try_collect(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.rx.recv().await {
            items.push(item?);
        }
        Ok(items)
    }
}

impl<T> Stream for PageStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
