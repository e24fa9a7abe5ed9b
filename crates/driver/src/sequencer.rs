//! The sequencing driver: starts, extends, seals, and recovers L2 blocks.
//!
//! The driver is single-threaded and cooperative. A scheduler repeatedly
//! calls [`Sequencer::plan_next_sequencer_action`] to learn how long to wait,
//! then [`Sequencer::run_next_sequencer_action`] to perform one step. In
//! Espresso mode a step starts a batch for the next sequencing window, polls
//! the query service for the window's blocks, or seals a completed batch
//! into an engine payload.

use crate::{
    batch::InProgressBatch,
    traits::{AttributesBuilder, EngineControl, L1OriginSelector, SequencerMetrics},
};
use op_espresso_derive::{
    errors::{PipelineError, PipelineErrorKind, PipelineResult, ResetError},
    origin::{espresso_batch_must_be_empty, espresso_l1_origin},
    traits::EspressoL1Provider,
    types::{
        BlockJustification, ExecutionPayload, Justification, L2BlockInfo, RawTransaction,
        RollupConfig, SystemConfig,
    },
};
use op_espresso_types::{Header, QueryService};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Margin reserved for sealing a block at the end of a native sequencing
/// slot, in milliseconds.
const SEALING_DURATION_MS: u64 = 50;

/// The sequencing mode of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerMode {
    /// The Espresso Sequencer orders transactions; the driver assembles
    /// batches from sequencing windows of Espresso blocks.
    Espresso,
    /// The rollup's native first-come-first-served sequencing.
    Legacy,
    /// The mode has not been determined from the system config yet.
    Unknown,
}

fn wall_clock_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// The sequencer implements the sequencing interface of the driver: it
/// starts and completes block building jobs.
#[derive(Debug)]
pub struct Sequencer<E, AB, OS, Q, M> {
    /// The rollup configuration.
    cfg: RollupConfig,
    /// The active system configuration.
    sys_cfg: SystemConfig,
    /// The current sequencing mode.
    mode: SequencerMode,
    /// The execution engine.
    engine: E,
    /// The payload attributes builder.
    attr_builder: AB,
    /// The L1 origin selector and provider.
    l1_origin_selector: OS,
    /// The Espresso query service.
    espresso: Q,
    /// Sequencer metrics.
    metrics: M,
    /// Returns the current wall-clock time in unix milliseconds. Injected so
    /// tests can control time.
    time_now: fn() -> u64,
    /// The earliest time at which the next action should run, if a back-off
    /// is in effect.
    next_action: Option<u64>,
    /// The Espresso batch currently being built, if any.
    espresso_batch: Option<InProgressBatch>,
}

impl<E, AB, OS, Q, M> Sequencer<E, AB, OS, Q, M>
where
    E: EngineControl + Send,
    AB: AttributesBuilder + Send,
    OS: L1OriginSelector + Send,
    Q: QueryService + Send,
    M: SequencerMetrics + Send,
{
    /// Creates a new sequencer. The mode starts out unknown and is detected
    /// from the system config on the first action.
    pub fn new(
        cfg: RollupConfig,
        sys_cfg: SystemConfig,
        engine: E,
        attr_builder: AB,
        l1_origin_selector: OS,
        espresso: Q,
        metrics: M,
    ) -> Self {
        Self {
            cfg,
            sys_cfg,
            mode: SequencerMode::Unknown,
            engine,
            attr_builder,
            l1_origin_selector,
            espresso,
            metrics,
            time_now: wall_clock_millis,
            next_action: None,
            espresso_batch: None,
        }
    }

    /// Overrides the wall clock. Intended for tests.
    pub fn with_time_now(mut self, time_now: fn() -> u64) -> Self {
        self.time_now = time_now;
        self
    }

    /// Returns the current sequencing mode.
    pub const fn mode(&self) -> SequencerMode {
        self.mode
    }

    /// Returns the L2 head reference that the latest block is or was being
    /// built on top of.
    pub fn building_onto(&self) -> L2BlockInfo {
        match &self.espresso_batch {
            Some(batch) => batch.onto,
            None => self.engine.building_payload().0,
        }
    }

    /// Returns a desired delay until the next [`Sequencer::run_next_sequencer_action`] call.
    pub fn plan_next_sequencer_action(&self) -> Duration {
        // Regardless of mode, the first priority is to not bother the engine if it is busy
        // building safe blocks (and thus changing the head that we would sync on top of).
        // Give it time to sync up.
        if let (onto, Some(_), true) = self.engine.building_payload() {
            warn!(
                target: "sequencer",
                "delaying sequencing to not interrupt safe-head changes, onto: {}", onto.block_info.hash
            );
            // Approximates the worst-case time it takes to build a block, to reattempt
            // sequencing after.
            return Duration::from_secs(self.cfg.block_time);
        }

        match self.mode {
            SequencerMode::Espresso => self.plan_next_espresso_action(),
            SequencerMode::Legacy => self.plan_next_legacy_action(),
            // If we don't yet know what mode we are in, the first action is discovering the
            // mode from the L2 system config. Start immediately, since it impacts the
            // scheduling of all future actions.
            SequencerMode::Unknown => Duration::ZERO,
        }
    }

    fn plan_next_espresso_action(&self) -> Duration {
        let head = self.engine.unsafe_l2_head();
        let now = (self.time_now)();

        // We may have to wait till the next sequencing action, e.g. upon an error. This delay
        // is ignored if we are building a block and the L2 head has changed, in which case we
        // need to respond immediately.
        let delay = self.next_action.map_or(0, |at| at.saturating_sub(now));
        let reorg = self
            .espresso_batch
            .as_ref()
            .is_some_and(|batch| batch.onto.block_info.hash != head.block_info.hash);
        if delay > 0 && !reorg {
            return Duration::from_millis(delay);
        }

        Duration::ZERO
    }

    fn plan_next_legacy_action(&self) -> Duration {
        let head = self.engine.unsafe_l2_head();
        let now = (self.time_now)();
        let (building_onto, building_id, _) = self.engine.building_payload();

        // If the head changed we need to respond and will not delay sequencing.
        let delay = self.next_action.map_or(0, |at| at.saturating_sub(now));
        if delay > 0 && building_onto.block_info.hash == head.block_info.hash {
            return Duration::from_millis(delay);
        }

        let block_time_ms = self.cfg.block_time * 1000;
        let payload_time_ms = (head.block_info.timestamp + self.cfg.block_time) * 1000;
        let remaining = payload_time_ms.saturating_sub(now);

        if building_id.is_some() && building_onto.block_info.hash == head.block_info.hash {
            // We started building already, so schedule the sealing with a margin before the
            // payload timestamp.
            Duration::from_millis(remaining.saturating_sub(SEALING_DURATION_MS))
        } else if remaining > block_time_ms {
            // If we have too much time, wait before starting the build.
            Duration::from_millis(remaining - block_time_ms)
        } else {
            Duration::ZERO
        }
    }

    /// Starts new block building work, or seals existing work, and is best timed by first
    /// awaiting the delay returned by [`Sequencer::plan_next_sequencer_action`]. If a new
    /// block is successfully sealed, it is returned for publishing.
    ///
    /// Only critical errors are bubbled up; other errors are handled internally:
    /// - Reset errors request an engine reset and back off one block time.
    /// - Temporary errors back off one second and retry.
    pub async fn run_next_sequencer_action(&mut self) -> PipelineResult<Option<ExecutionPayload>> {
        // As in planning, give the engine room while it is committing safe blocks.
        let (onto, building_id, safe) = self.engine.building_payload();
        if building_id.is_some() && safe {
            warn!(
                target: "sequencer",
                "avoiding sequencing to not interrupt safe-head changes, onto: {}", onto.block_info.hash
            );
            self.delay_ms(self.cfg.block_time * 1000);
            return Ok(None);
        }

        match self.mode {
            SequencerMode::Espresso => self.build_espresso_batch().await,
            SequencerMode::Legacy => self.build_legacy_block(building_id.is_some()).await,
            SequencerMode::Unknown => {
                // Figure out the mode, then return to the scheduler to plan the next action.
                if let Err(err) = self.detect_mode().await {
                    self.handle_non_engine_error("determining mode", err)?;
                }
                Ok(None)
            }
        }
    }

    async fn detect_mode(&mut self) -> PipelineResult<()> {
        let head = self.engine.unsafe_l2_head();
        let espresso = self.attr_builder.child_needs_justification(head).await?;
        self.mode = if espresso { SequencerMode::Espresso } else { SequencerMode::Legacy };
        info!(target: "sequencer", "detected sequencing mode: {:?}", self.mode);
        Ok(())
    }

    fn delay_ms(&mut self, delay: u64) {
        self.next_action = Some((self.time_now)() + delay);
    }

    fn handle_non_engine_error(
        &mut self,
        action: &str,
        err: PipelineErrorKind,
    ) -> PipelineResult<()> {
        if err.is_critical() {
            return Err(err);
        }
        error!(target: "sequencer", "sequencer temporarily failed {action}: {err}");
        self.delay_ms(1000);
        Ok(())
    }

    fn handle_possible_engine_error(
        &mut self,
        action: &str,
        err: PipelineErrorKind,
    ) -> PipelineResult<()> {
        if err.is_critical() {
            Err(err)
        } else if err.is_reset() {
            error!(target: "sequencer", "sequencer failed {action}, requiring derivation reset: {err}");
            self.metrics.record_sequencer_reset();
            // Hold off from sequencing for a full block.
            self.delay_ms(self.cfg.block_time * 1000);
            self.engine.reset();
            Ok(())
        } else {
            self.handle_non_engine_error(action, err)
        }
    }

    // --- Espresso mode ---

    async fn build_espresso_batch(&mut self) -> PipelineResult<Option<ExecutionPayload>> {
        // First, check if there has been a reorg. If so, drop the current batch and restart.
        let head = self.engine.unsafe_l2_head();
        if self
            .espresso_batch
            .as_ref()
            .is_some_and(|batch| batch.onto.block_info.hash != head.block_info.hash)
        {
            info!(target: "sequencer", "L2 head changed, discarding in-progress Espresso batch");
            self.espresso_batch = None;
        }

        // Begin a new batch if necessary.
        if self.espresso_batch.is_none() {
            if let Err(err) = self.start_building_espresso_batch(head).await {
                self.handle_non_engine_error("starting Espresso batch", err)?;
                return Ok(None);
            }
        }

        // Poll for new Espresso blocks and see if we can seal the batch.
        match self.try_to_seal_espresso_batch().await {
            Err(err) => {
                self.handle_possible_engine_error("sealing Espresso batch", err)?;
                Ok(None)
            }
            Ok(None) => {
                // We reached the end of the Espresso block stream without closing the window.
                // Wait a reasonable amount of time before checking for more blocks.
                self.delay_ms(1000);
                Ok(None)
            }
            // The batch was sealed. Do not set a delay, so that the scheduler starts the next
            // batch immediately.
            Ok(Some(payload)) => Ok(Some(payload)),
        }
    }

    /// Initiates an Espresso batch building job on top of the given L2 head.
    /// After this function succeeds, `self.espresso_batch` is `Some`.
    async fn start_building_espresso_batch(&mut self, l2_head: L2BlockInfo) -> PipelineResult<()> {
        let window_start = l2_head.block_info.timestamp + self.cfg.block_time;
        let window_end = window_start + self.cfg.block_time;

        let res = self
            .espresso
            .fetch_headers_for_window(window_start, window_end)
            .await
            .map_err(|err| PipelineError::Provider(err.to_string()).temp())?;

        debug!(
            target: "sequencer",
            "started Espresso batch for window [{window_start}, {window_end}), {} headers available",
            res.window.len()
        );
        self.espresso_batch =
            Some(InProgressBatch::new(l2_head, window_start, window_end, res.prev));
        self.update_espresso_batch(res.window, res.next).await
    }

    /// Appends the given in-window Espresso blocks to the current batch,
    /// fetching their namespace transactions and proofs, and records the
    /// trailing bookend once the external sequencer has produced it.
    async fn update_espresso_batch(
        &mut self,
        new_headers: Vec<Header>,
        next: Option<Header>,
    ) -> PipelineResult<()> {
        let namespace = self.cfg.espresso_namespace();
        let batch = self.espresso_batch.as_mut().expect("in-progress batch must exist");
        for header in new_headers {
            if header.timestamp >= batch.window_end {
                // The query service claims this header is in-window; its own invariants are
                // broken and nothing it serves can be trusted.
                return Err(PipelineError::MalformedWindow(format!(
                    "header at height {} stamped {} past window end {}",
                    header.height, header.timestamp, batch.window_end
                ))
                .crit());
            }
            if let Some(last) = batch.blocks.last() {
                if header.timestamp < last.header.timestamp {
                    warn!(
                        target: "sequencer",
                        "Espresso timestamps decreased from {} to {} within a window",
                        last.header.timestamp, header.timestamp
                    );
                }
            }

            let res = self
                .espresso
                .fetch_transactions_in_block(batch.next_height(), &header, namespace)
                .await
                .map_err(|err| PipelineError::Provider(err.to_string()).temp())?;

            batch.transactions.push(res.transactions);
            batch.blocks.push(BlockJustification { header, proof: Some(res.proof) });
        }
        if next.is_some() {
            batch.next = next;
        }
        Ok(())
    }

    /// Polls for new Espresso blocks to append to the current batch. If the
    /// batch is then complete (the external sequencer has produced at least
    /// one block past the end of the window) it is submitted to the engine
    /// and the resulting payload returned. Returns `None` if the batch
    /// cannot be sealed yet.
    async fn try_to_seal_espresso_batch(&mut self) -> PipelineResult<Option<ExecutionPayload>> {
        let batch = self.espresso_batch.as_ref().expect("in-progress batch must exist");
        if !batch.complete() {
            let (from, window_end) = (batch.next_height(), batch.window_end);
            let res = self
                .espresso
                .fetch_remaining_headers_for_window(from, window_end)
                .await
                .map_err(|err| PipelineError::Provider(err.to_string()).temp())?;
            self.update_espresso_batch(res.window, res.next).await?;
        }

        let batch = self.espresso_batch.as_ref().expect("in-progress batch must exist");
        if batch.complete() {
            self.seal_espresso_batch().await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Seals the current Espresso batch: deterministically selects its L1
    /// origin, assembles the justification, and submits the block to the
    /// engine.
    async fn seal_espresso_batch(&mut self) -> PipelineResult<ExecutionPayload> {
        let batch = self.espresso_batch.as_ref().expect("in-progress batch must exist");
        let parent = batch.onto;
        let next = batch.next.clone().expect("sealed batch must have a trailing bookend");

        // Determine the L1 origin, handling the windows in which Espresso did not provide an
        // eligible origin:
        // 1) Espresso produced no blocks in the window. Keep the parent's L1 origin: it may be
        //    old, but an empty batch is allowed to be old, and advancing could force the
        //    derivation pipeline to block on an unavailable L1 block.
        // 2) Espresso skipped an L1 block. Produce an empty batch that advances the L1 origin
        //    by one, so the L2 catches up without waiting for more Espresso blocks.
        // 3) The suggested origin is too old. The deterministic selection advances by one and
        //    the drift rule forces the batch empty.
        let (l1_origin, include_transactions) = if batch.blocks.is_empty() {
            let origin =
                self.l1_origin_selector.l1_block_ref_by_number(parent.l1_origin.number).await?;
            info!(target: "sequencer", "empty Espresso window, sealing empty batch on origin {}", origin.number);
            (origin, false)
        } else if next.l1_head > parent.l1_origin.number + 1 {
            let origin = self
                .l1_origin_selector
                .l1_block_ref_by_number(parent.l1_origin.number + 1)
                .await?;
            info!(target: "sequencer", "Espresso skipped an L1 block, sealing empty batch on origin {}", origin.number);
            (origin, false)
        } else {
            let origin = espresso_l1_origin(
                &self.cfg,
                &self.sys_cfg,
                parent,
                next.l1_head,
                &mut self.l1_origin_selector,
            )
            .await?;
            let empty = espresso_batch_must_be_empty(&self.cfg, &origin, batch.window_start);
            if empty {
                info!(target: "sequencer", "L2 is catching up to L1, sealing empty batch on origin {}", origin.number);
            }
            (origin, !empty)
        };

        let batch = self.espresso_batch.as_ref().expect("in-progress batch must exist");
        let blocks = if include_transactions {
            batch.blocks.clone()
        } else {
            // Ineligible batches are sealed empty; their justification keeps the window's
            // headers but sheds the namespace proofs.
            batch
                .blocks
                .iter()
                .map(|block| BlockJustification { header: block.header.clone(), proof: None })
                .collect()
        };
        let justification =
            Justification { prev: batch.prev.clone(), blocks, next };

        let mut attrs = self
            .attr_builder
            .prepare_payload_attributes(parent, l1_origin.id(), Some(&justification))
            .await?;
        attrs.no_tx_pool = true;
        if include_transactions {
            attrs.transactions.extend(
                batch
                    .transactions
                    .iter()
                    .flatten()
                    .map(|tx| RawTransaction(alloy_primitives::Bytes::copy_from_slice(tx.as_ref()))),
            );
        }

        debug!(
            target: "sequencer",
            "prepared attributes for new Espresso block, num: {}, time: {}, origin: {}",
            parent.block_info.number + 1, attrs.timestamp, l1_origin.number
        );

        // Start a payload building job and immediately seal it in the engine.
        self.engine.start_payload(parent, attrs, false).await?;
        let payload = match self.engine.confirm_payload().await {
            Ok(payload) => payload,
            Err(err) => {
                let _ = self.engine.cancel_payload(true).await;
                return Err(err);
            }
        };
        self.espresso_batch = None;
        Ok(payload)
    }

    // --- Legacy (native) mode ---

    async fn build_legacy_block(
        &mut self,
        building: bool,
    ) -> PipelineResult<Option<ExecutionPayload>> {
        if building {
            match self.engine.confirm_payload().await {
                Ok(payload) => {
                    info!(
                        target: "sequencer",
                        "sequencer successfully built a new block, block: {}, txs: {}",
                        payload.block_number,
                        payload.transactions.len()
                    );
                    Ok(Some(payload))
                }
                Err(err) if err.is_critical() => Err(err),
                Err(err) if err.is_reset() => {
                    error!(target: "sequencer", "sequencer failed to seal new block, requiring derivation reset: {err}");
                    self.metrics.record_sequencer_reset();
                    self.delay_ms(self.cfg.block_time * 1000);
                    let _ = self.engine.cancel_payload(true).await;
                    self.engine.reset();
                    Ok(None)
                }
                Err(err) => {
                    // We do not explicitly cancel block building jobs on temporary errors:
                    // the block may still be finished later.
                    error!(target: "sequencer", "sequencer failed temporarily to seal new block: {err}");
                    self.delay_ms(1000);
                    Ok(None)
                }
            }
        } else {
            if let Err(err) = self.start_building_legacy_block().await {
                self.handle_possible_engine_error("starting new block", err)?;
            } else {
                let (parent, building_id, _) = self.engine.building_payload();
                info!(
                    target: "sequencer",
                    "sequencer started building new block, payload_id: {building_id:?}, parent: {}",
                    parent.block_info.hash
                );
            }
            Ok(None)
        }
    }

    async fn start_building_legacy_block(&mut self) -> PipelineResult<()> {
        let l2_head = self.engine.unsafe_l2_head();

        // Figure out which L1 origin block we're going to be building on top of.
        let l1_origin = self.l1_origin_selector.find_l1_origin(l2_head).await?;

        if !(l2_head.l1_origin.hash == l1_origin.parent_hash
            || l2_head.l1_origin.hash == l1_origin.hash)
        {
            self.metrics.record_sequencer_inconsistent_l1_origin(l2_head.l1_origin, l1_origin.id());
            return Err(ResetError::L1OriginMismatch(l2_head.l1_origin.number, l1_origin.number)
                .reset());
        }

        info!(
            target: "sequencer",
            "creating new block, parent: {}, l1_origin: {}", l2_head.block_info.hash, l1_origin.number
        );

        let mut attrs =
            self.attr_builder.prepare_payload_attributes(l2_head, l1_origin.id(), None).await?;

        // If the next L2 block timestamp is beyond the sequencer drift threshold, we must
        // produce empty blocks (other than the L1 info deposit and any user deposits).
        attrs.no_tx_pool = attrs.timestamp > l1_origin.timestamp + self.cfg.max_sequencer_drift;

        self.engine.start_payload(l2_head, attrs, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        CountingMetrics, TestAttributesBuilder, TestEngine, TestOriginSelector, TestQueryService,
    };
    use op_espresso_derive::{
        errors::ResetError,
        test_utils::TestEspressoL1Provider,
        types::{BatchValidity, BlockInfo, PayloadAttributes, SingleBatch},
    };
    use op_espresso_types::Bytes;

    type TestSequencer = Sequencer<
        TestEngine,
        TestAttributesBuilder,
        TestOriginSelector,
        TestQueryService,
        CountingMetrics,
    >;

    fn test_now() -> u64 {
        5_000_000
    }

    fn config() -> (RollupConfig, SystemConfig) {
        let cfg = RollupConfig {
            block_time: 2,
            max_sequencer_drift: 6,
            seq_window_size: 4,
            l2_chain_id: 901,
            ..Default::default()
        };
        let sys_cfg = SystemConfig { espresso: true, ..Default::default() };
        (cfg, sys_cfg)
    }

    fn l1_chain() -> Vec<BlockInfo> {
        (0..3u64)
            .map(|number| BlockInfo {
                hash: alloy_primitives::B256::with_last_byte(0x10 + number as u8),
                number,
                parent_hash: alloy_primitives::B256::with_last_byte(0x0F + number as u8),
                timestamp: 1000 + number * 7,
            })
            .collect()
    }

    fn head_on(origin: &BlockInfo, number: u64, timestamp: u64) -> L2BlockInfo {
        L2BlockInfo {
            block_info: BlockInfo {
                hash: alloy_primitives::B256::with_last_byte(0x80 + number as u8),
                number,
                parent_hash: alloy_primitives::B256::with_last_byte(0x7F + number as u8),
                timestamp,
            },
            l1_origin: origin.id(),
            seq_num: 0,
        }
    }

    fn espresso_header(height: u64, timestamp: u64, l1_head: u64) -> Header {
        Header { height, timestamp, l1_head, ..Default::default() }
    }

    fn sequencer(
        head: L2BlockInfo,
        headers: Vec<Header>,
        transactions: Vec<Vec<Bytes>>,
        available: usize,
    ) -> TestSequencer {
        let (cfg, sys_cfg) = config();
        let engine = TestEngine { head, ..Default::default() };
        let attr_builder =
            TestAttributesBuilder { block_time: cfg.block_time, espresso: true, ..Default::default() };
        let l1_origin_selector = TestOriginSelector {
            l1: TestEspressoL1Provider::with_blocks(l1_chain()),
            next_origin: None,
        };
        let espresso = TestQueryService {
            all_headers: headers,
            transactions,
            available,
            namespace: cfg.l2_chain_id,
            unavailable: None,
        };
        let mut sequencer = Sequencer::new(
            cfg,
            sys_cfg,
            engine,
            attr_builder,
            l1_origin_selector,
            espresso,
            CountingMetrics::default(),
        )
        .with_time_now(test_now);
        sequencer.mode = SequencerMode::Espresso;
        sequencer
    }

    /// Re-validates a sealed payload the way a verifier would, from the same
    /// headers and L1 state the driver used.
    async fn revalidate(seq: &TestSequencer, head: L2BlockInfo, payload: &ExecutionPayload) -> BatchValidity {
        let epoch = seq.attr_builder.last_epoch.expect("attributes were prepared");
        let batch = SingleBatch {
            parent_hash: head.block_info.hash,
            epoch_num: epoch.number,
            epoch_hash: epoch.hash,
            timestamp: payload.timestamp,
            transactions: payload.transactions.clone(),
            justification: seq.attr_builder.last_justification.clone(),
        };
        let chain = l1_chain();
        let mut l1 = TestEspressoL1Provider::with_blocks(chain.clone())
            .headers(seq.espresso.all_headers.clone());
        batch.check_batch(&seq.cfg, &seq.sys_cfg, &chain, head, &chain[0], &mut l1).await
    }

    #[tokio::test]
    async fn test_detects_mode_first() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        let mut seq = sequencer(head, vec![], vec![], 0);
        seq.mode = SequencerMode::Unknown;

        assert_eq!(seq.plan_next_sequencer_action(), Duration::ZERO);
        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        assert_eq!(seq.mode(), SequencerMode::Espresso);
    }

    #[tokio::test]
    async fn test_builds_and_seals_batch() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        // One block in the window [1002, 1004), closed by a block at the window end.
        let headers = vec![
            espresso_header(0, 1001, 0),
            espresso_header(1, 1002, 0),
            espresso_header(2, 1004, 0),
        ];
        let transactions =
            vec![vec![], vec![Bytes(vec![0xAA, 0x01]), Bytes(vec![0xBB])], vec![]];
        let mut seq = sequencer(head, headers, transactions, 3);

        let payload = seq.run_next_sequencer_action().await.unwrap().expect("sealed");
        assert_eq!(payload.timestamp, 1002);
        assert_eq!(payload.block_number, 101);
        assert_eq!(payload.transactions.len(), 2);
        assert!(seq.espresso_batch.is_none());
        // A sealed batch sets no delay: the next window starts immediately.
        assert_eq!(seq.next_action, None);

        let jst = seq.attr_builder.last_justification.as_ref().unwrap();
        assert_eq!(jst.prev.as_ref().unwrap().height, 0);
        assert_eq!(jst.blocks.len(), 1);
        assert!(jst.blocks[0].proof.is_some());
        assert_eq!(jst.next.height, 2);
        assert_eq!(seq.attr_builder.last_epoch.unwrap().number, 0);

        // Producer/consumer agreement: a verifier accepts the sealed batch.
        assert_eq!(revalidate(&seq, head, &payload).await, BatchValidity::Accept);
    }

    #[tokio::test]
    async fn test_open_window_polls_until_closed() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        let headers = vec![
            espresso_header(0, 1001, 0),
            espresso_header(1, 1002, 0),
            espresso_header(2, 1004, 0),
        ];
        let transactions = vec![vec![], vec![Bytes(vec![0xAA])], vec![]];
        // Only the leading bookend and the in-window block exist so far.
        let mut seq = sequencer(head, headers, transactions, 2);

        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        let batch = seq.espresso_batch.as_ref().unwrap();
        assert_eq!(batch.blocks.len(), 1);
        assert!(!batch.complete());
        // The driver waits a second before polling for more headers.
        assert_eq!(seq.next_action, Some(test_now() + 1000));
        assert_eq!(seq.plan_next_sequencer_action(), Duration::from_millis(1000));

        // Nothing new: polling again leaves the batch unchanged.
        seq.next_action = None;
        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        assert_eq!(seq.espresso_batch.as_ref().unwrap().blocks.len(), 1);

        // The window-closing block arrives; the batch seals.
        seq.espresso.available = 3;
        seq.next_action = None;
        let payload = seq.run_next_sequencer_action().await.unwrap().expect("sealed");
        assert_eq!(payload.transactions.len(), 1);
        assert_eq!(revalidate(&seq, head, &payload).await, BatchValidity::Accept);
    }

    #[tokio::test]
    async fn test_empty_window_seals_empty_batch() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        // No Espresso block falls in [1002, 1004).
        let headers = vec![espresso_header(0, 1001, 0), espresso_header(1, 2002, 0)];
        let mut seq = sequencer(head, headers, vec![vec![], vec![]], 2);

        let payload = seq.run_next_sequencer_action().await.unwrap().expect("sealed");
        assert!(payload.transactions.is_empty());
        // The L1 origin is the parent's.
        assert_eq!(seq.attr_builder.last_epoch.unwrap().number, 0);
        let jst = seq.attr_builder.last_justification.as_ref().unwrap();
        assert!(jst.blocks.is_empty());
        assert_eq!(revalidate(&seq, head, &payload).await, BatchValidity::Accept);
    }

    #[tokio::test]
    async fn test_skipped_l1_block_seals_empty_batch() {
        let chain = l1_chain();
        // The window [1008, 1010) opens after the second L1 block's timestamp.
        let head = head_on(&chain[0], 103, 1006);
        let headers = vec![
            espresso_header(0, 1007, 0),
            espresso_header(1, 1008, 2),
            espresso_header(2, 1010, 2),
        ];
        let transactions = vec![vec![], vec![Bytes(vec![0xAA])], vec![]];
        let mut seq = sequencer(head, headers, transactions, 3);

        let payload = seq.run_next_sequencer_action().await.unwrap().expect("sealed");
        // The batch is empty and advances the origin by one so the L2 catches up.
        assert!(payload.transactions.is_empty());
        assert_eq!(seq.attr_builder.last_epoch.unwrap().number, 1);
        let jst = seq.attr_builder.last_justification.as_ref().unwrap();
        // The window's blocks stay in the justification, with proofs stripped.
        assert_eq!(jst.blocks.len(), 1);
        assert!(jst.blocks[0].proof.is_none());
        assert_eq!(revalidate(&seq, head, &payload).await, BatchValidity::Accept);
    }

    #[tokio::test]
    async fn test_reorg_discards_batch() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        let headers = vec![espresso_header(0, 1001, 0), espresso_header(1, 1002, 0)];
        let mut seq = sequencer(head, headers, vec![vec![], vec![Bytes(vec![0xAA])]], 2);

        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        assert_eq!(seq.espresso_batch.as_ref().unwrap().onto, head);

        // The engine head moves: the delay is ignored and the batch is rebuilt.
        let new_head = head_on(&chain[0], 100, 1000);
        let new_head = L2BlockInfo {
            block_info: BlockInfo {
                hash: alloy_primitives::B256::with_last_byte(0xEE),
                ..new_head.block_info
            },
            ..new_head
        };
        seq.engine.head = new_head;
        assert_eq!(seq.plan_next_sequencer_action(), Duration::ZERO);
        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        assert_eq!(seq.espresso_batch.as_ref().unwrap().onto, new_head);
    }

    #[tokio::test]
    async fn test_engine_building_safe_block_defers() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        let mut seq = sequencer(head, vec![], vec![], 0);
        seq.engine.building = Some((head, PayloadAttributes::default()));
        seq.engine.building_safe = true;

        assert_eq!(seq.plan_next_sequencer_action(), Duration::from_secs(2));
        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        assert_eq!(seq.next_action, Some(test_now() + 2000));
        assert!(seq.espresso_batch.is_none());
    }

    #[tokio::test]
    async fn test_query_service_outage_backs_off() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        let mut seq = sequencer(head, vec![], vec![], 0);
        seq.espresso.unavailable = Some("connection refused".to_string());

        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        assert!(seq.espresso_batch.is_none());
        assert_eq!(seq.next_action, Some(test_now() + 1000));
    }

    #[tokio::test]
    async fn test_engine_reset_error_backs_off_block_time() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        let headers = vec![
            espresso_header(0, 1001, 0),
            espresso_header(1, 1002, 0),
            espresso_header(2, 1004, 0),
        ];
        let mut seq = sequencer(head, headers, vec![vec![], vec![], vec![]], 3);
        seq.engine.start_error =
            Some(ResetError::EngineReset("forkchoice out of sync".to_string()).reset());

        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        assert_eq!(seq.engine.resets, 1);
        assert_eq!(seq.metrics.resets, 1);
        assert_eq!(seq.next_action, Some(test_now() + 2000));
    }

    #[tokio::test]
    async fn test_tampered_batch_is_dropped() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        let headers = vec![
            espresso_header(0, 1001, 0),
            espresso_header(1, 1002, 0),
            espresso_header(2, 1004, 0),
        ];
        let mut seq = sequencer(head, headers, vec![vec![], vec![Bytes(vec![0xAA])], vec![]], 3);
        let payload = seq.run_next_sequencer_action().await.unwrap().expect("sealed");

        // A Byzantine relayer claims a different epoch for the sealed batch.
        let epoch = seq.attr_builder.last_epoch.unwrap();
        let batch = SingleBatch {
            parent_hash: head.block_info.hash,
            epoch_num: epoch.number + 1,
            epoch_hash: l1_chain()[1].hash,
            timestamp: payload.timestamp,
            transactions: payload.transactions.clone(),
            justification: seq.attr_builder.last_justification.clone(),
        };
        let verifier_chain = l1_chain();
        let mut l1 = TestEspressoL1Provider::with_blocks(verifier_chain.clone())
            .headers(seq.espresso.all_headers.clone());
        let validity = batch
            .check_batch(&seq.cfg, &seq.sys_cfg, &verifier_chain, head, &verifier_chain[0], &mut l1)
            .await;
        assert_eq!(validity, BatchValidity::Drop);
    }

    #[tokio::test]
    async fn test_legacy_mode_builds_block() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        let mut seq = sequencer(head, vec![], vec![], 0);
        seq.mode = SequencerMode::Legacy;
        seq.l1_origin_selector.next_origin = Some(chain[0]);

        // First action starts the build job, the second seals it.
        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        assert!(seq.engine.building.is_some());
        let payload = seq.run_next_sequencer_action().await.unwrap().expect("sealed");
        assert_eq!(payload.block_number, 101);
    }

    #[tokio::test]
    async fn test_legacy_inconsistent_origin_resets() {
        let chain = l1_chain();
        let head = head_on(&chain[0], 100, 1000);
        let mut seq = sequencer(head, vec![], vec![], 0);
        seq.mode = SequencerMode::Legacy;
        // An origin unrelated to the head's origin chain.
        seq.l1_origin_selector.next_origin = Some(BlockInfo {
            hash: alloy_primitives::B256::with_last_byte(0xDD),
            number: 5,
            parent_hash: alloy_primitives::B256::with_last_byte(0xDC),
            timestamp: 1100,
        });

        assert!(seq.run_next_sequencer_action().await.unwrap().is_none());
        assert_eq!(seq.metrics.inconsistent_origins, 1);
        assert_eq!(seq.metrics.resets, 1);
        assert_eq!(seq.engine.resets, 1);
    }
}
