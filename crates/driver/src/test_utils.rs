//! Test utilities for the sequencing driver.

use crate::traits::{AttributesBuilder, EngineControl, L1OriginSelector, SequencerMetrics};
use async_trait::async_trait;
use op_espresso_derive::{
    errors::{PipelineError, PipelineResult},
    test_utils::TestEspressoL1Provider,
    traits::EspressoL1Provider,
    types::{
        BlockID, BlockInfo, ExecutionPayload, Justification, L2BlockInfo, PayloadAttributes,
        PayloadId,
    },
};
use op_espresso_types::{
    Bytes, Commitment, Header, QueryService, TransactionsInBlock, WindowMore, WindowStart,
};
use std::fmt;

/// An error returned by the test query service.
#[derive(Debug, Clone)]
pub struct TestQueryError(
    /// The failure message.
    pub String,
);

impl fmt::Display for TestQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A mock Espresso query service over a fixed stream of headers, indexed by
/// height. Only the first `available` headers are visible, so tests can
/// simulate the external sequencer producing blocks over time.
#[derive(Debug, Clone, Default)]
pub struct TestQueryService {
    /// Every header the external sequencer will ever produce, by height.
    pub all_headers: Vec<Header>,
    /// The namespace transactions of each block, by height.
    pub transactions: Vec<Vec<Bytes>>,
    /// How many headers have been produced so far.
    pub available: usize,
    /// The rollup's namespace.
    pub namespace: u64,
    /// When set, every query fails with this message.
    pub unavailable: Option<String>,
}

impl TestQueryService {
    fn visible(&self) -> &[Header] {
        &self.all_headers[..self.available.min(self.all_headers.len())]
    }

    fn check_up(&self) -> Result<(), TestQueryError> {
        match &self.unavailable {
            Some(reason) => Err(TestQueryError(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QueryService for TestQueryService {
    type Error = TestQueryError;

    async fn fetch_headers_for_window(
        &mut self,
        start: u64,
        end: u64,
    ) -> Result<WindowStart, Self::Error> {
        self.check_up()?;
        let prev = self.visible().iter().filter(|h| h.timestamp < start).next_back().cloned();
        let window: Vec<Header> = self
            .visible()
            .iter()
            .filter(|h| h.timestamp >= start && h.timestamp < end)
            .cloned()
            .collect();
        let next = self.visible().iter().find(|h| h.timestamp >= end).cloned();
        let from = window
            .first()
            .map(|h| h.height)
            .or(next.as_ref().map(|h| h.height))
            .unwrap_or_else(|| prev.as_ref().map_or(0, |h| h.height + 1));
        Ok(WindowStart { from, window, prev, next })
    }

    async fn fetch_remaining_headers_for_window(
        &mut self,
        from: u64,
        end: u64,
    ) -> Result<WindowMore, Self::Error> {
        self.check_up()?;
        let window: Vec<Header> = self
            .visible()
            .iter()
            .filter(|h| h.height >= from && h.timestamp < end)
            .cloned()
            .collect();
        let next = self.visible().iter().find(|h| h.timestamp >= end).cloned();
        Ok(WindowMore { window, next })
    }

    async fn fetch_transactions_in_block(
        &mut self,
        height: u64,
        expected_header: &Header,
        namespace: u64,
    ) -> Result<TransactionsInBlock, Self::Error> {
        self.check_up()?;
        if namespace != self.namespace {
            return Err(TestQueryError(format!("wrong namespace {namespace}")));
        }
        let header = self
            .visible()
            .get(height as usize)
            .ok_or_else(|| TestQueryError(format!("block {height} not available")))?;
        // The query service contract: the fetched block must be the expected one.
        if header.commit() != expected_header.commit() {
            return Err(TestQueryError(format!("commitment mismatch at height {height}")));
        }
        Ok(TransactionsInBlock {
            transactions: self.transactions.get(height as usize).cloned().unwrap_or_default(),
            proof: Bytes(vec![0xF0, height as u8]),
        })
    }
}

/// A mock engine with a single building slot and injectable failures.
#[derive(Debug, Clone, Default)]
pub struct TestEngine {
    /// The current unsafe L2 head.
    pub head: L2BlockInfo,
    /// The open block building job, if any.
    pub building: Option<(L2BlockInfo, PayloadAttributes)>,
    /// Whether the open job is building a safe block.
    pub building_safe: bool,
    /// Error to return from the next `start_payload`.
    pub start_error: Option<op_espresso_derive::errors::PipelineErrorKind>,
    /// Error to return from the next `confirm_payload`.
    pub confirm_error: Option<op_espresso_derive::errors::PipelineErrorKind>,
    /// Number of derivation resets requested.
    pub resets: usize,
    /// Number of cancelled build jobs.
    pub cancels: usize,
}

#[async_trait]
impl EngineControl for TestEngine {
    fn unsafe_l2_head(&self) -> L2BlockInfo {
        self.head
    }

    fn building_payload(&self) -> (L2BlockInfo, Option<PayloadId>, bool) {
        match &self.building {
            Some((parent, _)) => (*parent, Some(PayloadId::from([1u8; 8])), self.building_safe),
            None => (self.head, None, false),
        }
    }

    async fn start_payload(
        &mut self,
        parent: L2BlockInfo,
        attributes: PayloadAttributes,
        _update_safe: bool,
    ) -> PipelineResult<()> {
        if let Some(err) = self.start_error.take() {
            return Err(err);
        }
        self.building = Some((parent, attributes));
        Ok(())
    }

    async fn confirm_payload(&mut self) -> PipelineResult<ExecutionPayload> {
        if let Some(err) = self.confirm_error.take() {
            return Err(err);
        }
        let (parent, attributes) = self
            .building
            .take()
            .ok_or_else(|| PipelineError::NotBuilding.crit())?;
        Ok(ExecutionPayload {
            parent_hash: parent.block_info.hash,
            block_hash: alloy_primitives::B256::with_last_byte(parent.block_info.number as u8 + 1),
            block_number: parent.block_info.number + 1,
            timestamp: attributes.timestamp,
            transactions: attributes.transactions,
        })
    }

    async fn cancel_payload(&mut self, _force: bool) -> PipelineResult<()> {
        self.cancels += 1;
        self.building = None;
        Ok(())
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

/// A mock attributes builder that stamps child blocks one block time after
/// their parent and records what it was asked to build.
#[derive(Debug, Clone, Default)]
pub struct TestAttributesBuilder {
    /// The L2 block time.
    pub block_time: u64,
    /// Whether child blocks need a justification (Espresso mode).
    pub espresso: bool,
    /// The epoch of the last prepared attributes.
    pub last_epoch: Option<BlockID>,
    /// The justification of the last prepared attributes.
    pub last_justification: Option<Justification>,
}

#[async_trait]
impl AttributesBuilder for TestAttributesBuilder {
    async fn prepare_payload_attributes(
        &mut self,
        parent: L2BlockInfo,
        epoch: BlockID,
        justification: Option<&Justification>,
    ) -> PipelineResult<PayloadAttributes> {
        self.last_epoch = Some(epoch);
        self.last_justification = justification.cloned();
        Ok(PayloadAttributes {
            timestamp: parent.block_info.timestamp + self.block_time,
            justification: justification.cloned(),
            ..Default::default()
        })
    }

    async fn child_needs_justification(&mut self, _parent: L2BlockInfo) -> PipelineResult<bool> {
        Ok(self.espresso)
    }
}

/// A mock origin selector delegating L1 access to a [TestEspressoL1Provider].
#[derive(Debug, Clone, Default)]
pub struct TestOriginSelector {
    /// The backing L1 provider.
    pub l1: TestEspressoL1Provider,
    /// The origin `find_l1_origin` hands to the native sequencing path.
    pub next_origin: Option<BlockInfo>,
}

#[async_trait]
impl EspressoL1Provider for TestOriginSelector {
    async fn l1_block_ref_by_number(&mut self, number: u64) -> PipelineResult<BlockInfo> {
        self.l1.l1_block_ref_by_number(number).await
    }

    async fn verify_commitments(
        &mut self,
        first_height: u64,
        commitments: &[Commitment],
    ) -> PipelineResult<bool> {
        self.l1.verify_commitments(first_height, commitments).await
    }
}

#[async_trait]
impl L1OriginSelector for TestOriginSelector {
    async fn find_l1_origin(&mut self, _l2_head: L2BlockInfo) -> PipelineResult<BlockInfo> {
        self.next_origin
            .ok_or_else(|| PipelineError::Provider("no L1 origin".to_string()).temp())
    }
}

/// A [SequencerMetrics] implementation that counts its events.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountingMetrics {
    /// Inconsistent-origin events recorded.
    pub inconsistent_origins: usize,
    /// Resets recorded.
    pub resets: usize,
}

impl SequencerMetrics for CountingMetrics {
    fn record_sequencer_inconsistent_l1_origin(&mut self, _from: BlockID, _to: BlockID) {
        self.inconsistent_origins += 1;
    }

    fn record_sequencer_reset(&mut self) {
        self.resets += 1;
    }
}
