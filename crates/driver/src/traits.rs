//! Traits for the host components the sequencing driver drives: the
//! execution engine, the payload attributes builder, and the L1 origin
//! selector.

use async_trait::async_trait;
use op_espresso_derive::{
    errors::PipelineResult,
    traits::EspressoL1Provider,
    types::{BlockID, BlockInfo, ExecutionPayload, Justification, L2BlockInfo, PayloadAttributes, PayloadId},
};

/// The sequencing interface of the execution engine: one block building job
/// at a time, which can be started, confirmed into a payload, or cancelled.
/// The engine can also be asked to reset derivation after an L1 reorg.
#[async_trait]
pub trait EngineControl {
    /// Returns the current unsafe L2 head of the engine.
    fn unsafe_l2_head(&self) -> L2BlockInfo;

    /// Returns the parent block being built upon, the id of the build job if
    /// one is open, and whether the engine is building a *safe* block (in
    /// which case the sequencer must not interrupt it).
    fn building_payload(&self) -> (L2BlockInfo, Option<PayloadId>, bool);

    /// Starts a block building job on top of the given parent, with the
    /// given payload attributes.
    async fn start_payload(
        &mut self,
        parent: L2BlockInfo,
        attributes: PayloadAttributes,
        update_safe: bool,
    ) -> PipelineResult<()>;

    /// Seals the current block building job and persists it as canonical.
    async fn confirm_payload(&mut self) -> PipelineResult<ExecutionPayload>;

    /// Cancels the current block building job.
    async fn cancel_payload(&mut self, force: bool) -> PipelineResult<()>;

    /// Requests a derivation reset. The engine will re-derive the safe chain
    /// from the canonical L1 before sequencing continues.
    fn reset(&mut self);
}

/// Builds the payload attributes for a new L2 block: the L1-info deposit
/// (carrying the justification in Espresso mode), user deposits, and the
/// block environment.
#[async_trait]
pub trait AttributesBuilder {
    /// Prepares payload attributes for a child block of `parent` with the
    /// given L1 origin.
    async fn prepare_payload_attributes(
        &mut self,
        parent: L2BlockInfo,
        epoch: BlockID,
        justification: Option<&Justification>,
    ) -> PipelineResult<PayloadAttributes>;

    /// Returns whether the child block of `parent` requires a justification,
    /// i.e. whether the system config active at the child has Espresso mode
    /// enabled. Used by the driver to detect its sequencing mode.
    async fn child_needs_justification(&mut self, parent: L2BlockInfo) -> PipelineResult<bool>;
}

/// Selects L1 origins for the sequencer. In Espresso mode origins are
/// determined by the deterministic selection function over the external
/// sequencer's suggestion, so only direct lookups are needed; the native
/// path picks origins from the L1 head.
#[async_trait]
pub trait L1OriginSelector: EspressoL1Provider {
    /// Finds the L1 origin for a native-sequenced L2 block building on
    /// `l2_head`.
    async fn find_l1_origin(&mut self, l2_head: L2BlockInfo) -> PipelineResult<BlockInfo>;
}

/// Metrics recorded by the sequencer.
pub trait SequencerMetrics {
    /// Records that the selected L1 origin is inconsistent with the L2 head.
    fn record_sequencer_inconsistent_l1_origin(&mut self, from: BlockID, to: BlockID);

    /// Records a derivation reset triggered by the sequencer.
    fn record_sequencer_reset(&mut self);
}

/// A [SequencerMetrics] implementation that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl SequencerMetrics for NoopMetrics {
    fn record_sequencer_inconsistent_l1_origin(&mut self, _from: BlockID, _to: BlockID) {}
    fn record_sequencer_reset(&mut self) {}
}
