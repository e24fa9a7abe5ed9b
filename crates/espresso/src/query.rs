//! The interface to the Espresso Sequencer query service.
//!
//! The node consumes this interface; the HTTP wire implementation lives with
//! the host. Window queries are by header timestamp, over the half-open range
//! `[start, end)`, and return bookend headers proving that no block at either
//! edge of the window was omitted.

use crate::types::{Bytes, Header, NmtProof};
use alloc::{boxed::Box, vec::Vec};
use async_trait::async_trait;
use core::fmt::Display;
use serde::{Deserialize, Serialize};

/// Response to [`QueryService::fetch_headers_for_window`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStart {
    /// The block height of the first block in the window, unless the window
    /// is empty, in which case this is the height of `next`.
    pub from: u64,
    /// The available block headers in the requested window.
    pub window: Vec<Header>,
    /// The header of the last block before the start of the window. This
    /// proves that the query service did not omit any blocks from the
    /// beginning of the window. Absent iff the Espresso genesis block falls
    /// in or after the window.
    pub prev: Option<Header>,
    /// The first block after the end of the window. This proves that the
    /// query service did not omit any blocks from the end of the window.
    /// Absent if the full window is not available yet, in which case
    /// [`QueryService::fetch_remaining_headers_for_window`] retrieves the
    /// rest of the window.
    pub next: Option<Header>,
}

/// Response to [`QueryService::fetch_remaining_headers_for_window`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMore {
    /// The additional blocks within the window which are available, if any.
    pub window: Vec<Header>,
    /// The first block after the end of the window, if the full window is
    /// available.
    pub next: Option<Header>,
}

/// Response to [`QueryService::fetch_transactions_in_block`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsInBlock {
    /// The transactions belonging to the requested namespace, in block order.
    pub transactions: Vec<Bytes>,
    /// A proof that these are all such transactions.
    pub proof: NmtProof,
}

/// The Espresso Sequencer query service.
#[async_trait]
pub trait QueryService {
    /// The error type returned by the query service.
    type Error: Display;

    /// Returns all the available headers whose timestamps fall in the window
    /// `[start, end)`.
    async fn fetch_headers_for_window(
        &mut self,
        start: u64,
        end: u64,
    ) -> Result<WindowStart, Self::Error>;

    /// Returns all the available headers starting with the block at height
    /// `from` whose timestamps are less than `end`. Used to continue fetching
    /// headers in a time window if not all headers in the window were
    /// available when [`QueryService::fetch_headers_for_window`] was called.
    async fn fetch_remaining_headers_for_window(
        &mut self,
        from: u64,
        end: u64,
    ) -> Result<WindowMore, Self::Error>;

    /// Returns the transactions belonging to the rollup's namespace in the
    /// block at the given height, along with a proof that these are all such
    /// transactions.
    ///
    /// Implementations must fail if the commitment of the fetched block does
    /// not equal `expected_header.commit()`.
    async fn fetch_transactions_in_block(
        &mut self,
        height: u64,
        expected_header: &Header,
        namespace: u64,
    ) -> Result<TransactionsInBlock, Self::Error>;
}
