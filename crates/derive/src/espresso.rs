//! The Espresso-specific half of batch validation.
//!
//! The generic pre-checks in [`SingleBatch::check_batch`] establish that a
//! candidate batch is well-formed on the native derivation rules. This module
//! then decides whether the batch is exactly what the Espresso Sequencer
//! endorsed for the sequencing window: the justification's headers must match
//! the commitments authenticated on L1, the bookends must surround the
//! window, the L1 origin must replay deterministically, and the included
//! transactions must be witnessed by the namespace proofs.

use crate::{
    bookend::{check_bookends, WindowEndpoint},
    origin::{espresso_batch_must_be_empty, espresso_l1_origin},
    traits::EspressoL1Provider,
    types::{BatchValidity, L2BlockInfo, RollupConfig, SingleBatch, SystemConfig},
};
use alloc::vec::Vec;
use op_espresso_types::nmt::validate_batch_transactions;

/// Checks a candidate batch against the Espresso Sequencer's endorsement of
/// its sequencing window. Returns [BatchValidity::Undecided] whenever the
/// decision requires L1 data that is not yet available.
pub async fn check_batch_espresso<P: EspressoL1Provider + Send>(
    cfg: &RollupConfig,
    sys_cfg: &SystemConfig,
    l2_safe_head: L2BlockInfo,
    batch: &SingleBatch,
    l1: &mut P,
) -> BatchValidity {
    let Some(jst) = &batch.justification else {
        warn!(target: "batch-validator", "dropping batch because it has no justification");
        return BatchValidity::Drop;
    };

    // First, check that the headers provided by the justification match those recorded by the
    // commitment contract, by comparing commitments.
    let commitments = jst.commitments();
    let first_height = jst.first_height();
    match l1.verify_commitments(first_height, &commitments).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(
                target: "batch-validator",
                "dropping batch because headers do not match contract, first: {first_height}, count: {}",
                commitments.len()
            );
            return BatchValidity::Drop;
        }
        Err(err) => {
            // The expected commitments cannot be read right now: maybe they have not been sent
            // to the commitment contract yet, or the L1 connection is down. Try again later.
            warn!(
                target: "batch-validator",
                "error reading expected commitments, first: {first_height}, count: {}, err: {err}",
                commitments.len()
            );
            return BatchValidity::Undecided;
        }
    }

    // The headers claimed by the justification are all legitimate. Now check that they
    // correctly define the start and end of the time window.
    let window_start = l2_safe_head.block_info.timestamp + cfg.block_time;
    let window_end = window_start + cfg.block_time;
    if !check_bookends(WindowEndpoint::Start, window_start, jst) {
        return BatchValidity::Drop;
    }
    if !check_bookends(WindowEndpoint::End, window_end, jst) {
        return BatchValidity::Drop;
    }

    // The sequencer does not guarantee strictly monotone timestamps inside a window.
    // Deployments that want to treat disorder as Byzantine can opt into rejection.
    let out_of_order = jst
        .blocks
        .windows(2)
        .any(|pair| pair[1].header.timestamp < pair[0].header.timestamp);
    if out_of_order {
        warn!(target: "batch-validator", "justification headers have out-of-order timestamps");
        if cfg.strict_espresso_timestamps {
            return BatchValidity::Drop;
        }
    }

    // The Espresso data in the justification is good. Check that the L2 batch is correctly
    // derived from the Espresso blocks. First, the L1 origin:
    let l1_origin =
        match espresso_l1_origin(cfg, sys_cfg, l2_safe_head, jst.next.l1_head, l1).await {
            Ok(l1_origin) => l1_origin,
            Err(err) => {
                warn!(
                    target: "batch-validator",
                    "error finding Espresso L1 origin, suggested: {}, err: {err}", jst.next.l1_head
                );
                return BatchValidity::Undecided;
            }
        };
    if l1_origin.number != batch.epoch_num {
        warn!(
            target: "batch-validator",
            "dropping batch because L1 origin was not set correctly, expected: {}, actual: {}",
            l1_origin.number,
            batch.epoch_num
        );
        return BatchValidity::Drop;
    }

    // Finally, the transactions:
    if espresso_batch_must_be_empty(cfg, &l1_origin, batch.timestamp) {
        if !batch.transactions.is_empty() {
            warn!(target: "batch-validator", "dropping batch because it must be empty but isn't");
            return BatchValidity::Drop;
        }
    } else {
        let roots: Vec<_> =
            jst.blocks.iter().map(|block| block.header.transactions_root.clone()).collect();
        let proofs: Vec<_> = jst.blocks.iter().map(|block| block.proof.clone()).collect();
        if let Err(err) = validate_batch_transactions(
            cfg.espresso_namespace(),
            &roots,
            &proofs,
            &batch.transactions,
        ) {
            warn!(target: "batch-validator", "dropping batch because of invalid NMT proofs, err: {err}");
            return BatchValidity::Drop;
        }
    }

    BatchValidity::Accept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::TestEspressoL1Provider,
        types::{BlockInfo, BlockJustification, Genesis, Justification, RawTransaction},
    };
    use alloc::{vec, vec::Vec};
    use alloy_primitives::B256;
    use op_espresso_types::Header;

    struct ValidBatchTestCase {
        name: &'static str,
        l1_blocks: Vec<BlockInfo>,
        l2_safe_head: L2BlockInfo,
        inclusion_block: BlockInfo,
        batch: SingleBatch,
        headers: Vec<Header>,
        expected: BatchValidity,
    }

    fn config() -> (RollupConfig, SystemConfig) {
        let sys_cfg = SystemConfig { espresso: true, ..Default::default() };
        let cfg = RollupConfig {
            // A genesis time that itself does not align, to make it more interesting.
            genesis: Genesis { l2_time: 31, ..Default::default() },
            block_time: 2,
            seq_window_size: 4,
            max_sequencer_drift: 6,
            l2_chain_id: 901,
            ..Default::default()
        };
        (cfg, sys_cfg)
    }

    fn hash(tag: u8) -> B256 {
        B256::repeat_byte(tag)
    }

    fn l1_block(number: u64, timestamp: u64) -> BlockInfo {
        BlockInfo {
            hash: hash(0x10 + number as u8),
            number,
            parent_hash: hash(0x0F + number as u8),
            timestamp,
        }
    }

    fn l2_ref(number: u64, timestamp: u64, l1_origin: &BlockInfo, seq_num: u64) -> L2BlockInfo {
        L2BlockInfo {
            block_info: BlockInfo {
                hash: hash(0x80 + number as u8),
                number,
                parent_hash: hash(0x7F + number as u8),
                timestamp,
            },
            l1_origin: l1_origin.id(),
            seq_num,
        }
    }

    fn header(height: u64, timestamp: u64, l1_head: u64) -> Header {
        Header { height, timestamp, l1_head, ..Default::default() }
    }

    fn justification(
        prev: Option<&Header>,
        blocks: &[&Header],
        next: &Header,
    ) -> Option<Justification> {
        Some(Justification {
            prev: prev.cloned(),
            blocks: blocks
                .iter()
                .map(|header| BlockJustification { header: (*header).clone(), proof: None })
                .collect(),
            next: next.clone(),
        })
    }

    fn empty_batch(
        parent: L2BlockInfo,
        epoch: &BlockInfo,
        timestamp: u64,
        justification: Option<Justification>,
    ) -> SingleBatch {
        SingleBatch {
            parent_hash: parent.block_info.hash,
            epoch_num: epoch.number,
            epoch_hash: epoch.hash,
            timestamp,
            transactions: vec![],
            justification,
        }
    }

    #[tokio::test]
    async fn test_valid_batch_espresso() {
        let (cfg, sys_cfg) = config();

        let l1_a = l1_block(0, 1000);
        let l1_b = l1_block(1, l1_a.timestamp + 7);
        let l1_c = l1_block(2, l1_b.timestamp + 7);
        let l1_chain = vec![l1_a, l1_b, l1_c];

        let l2_a0 = l2_ref(100, l1_a.timestamp, &l1_a, 0);
        let l2_a1 = l2_ref(101, l2_a0.block_info.timestamp + cfg.block_time, &l1_a, 1);
        let l2_a2 = l2_ref(102, l2_a1.block_info.timestamp + cfg.block_time, &l1_a, 2);
        let l2_a3 = l2_ref(103, l2_a2.block_info.timestamp + cfg.block_time, &l1_a, 3);
        // 8 seconds after l1_a, 1 after its own origin.
        let l2_b0 = l2_ref(104, l2_a3.block_info.timestamp + cfg.block_time, &l1_b, 0);

        let a1_time = l2_a1.block_info.timestamp;
        let a2_time = l2_a2.block_info.timestamp;
        let a3_time = l2_a3.block_info.timestamp;
        let b0_time = l2_b0.block_info.timestamp;

        // Three valid windows, with varying numbers of Espresso blocks in the window.
        let hotshot: Vec<Header> = [
            a1_time - 1,
            a1_time,
            a2_time,
            a2_time + 1,
            a3_time,
            a3_time + 1,
            a3_time + 1,
            a3_time + cfg.block_time,
        ]
        .iter()
        .enumerate()
        .map(|(height, timestamp)| header(height as u64, *timestamp, 0))
        .collect();

        // The external sequencer skipped an L1 block.
        let skipped: Vec<Header> = vec![
            header(0, b0_time - 1, 0),
            header(1, b0_time, l1_a.number + 2),
            header(2, b0_time + cfg.block_time, l1_a.number + 2),
        ];

        // A window with no Espresso blocks at all.
        let empty_window: Vec<Header> =
            vec![header(0, a1_time - 1, 0), header(1, a1_time + 1000, 0)];

        // The sequencer tries to fool the validator by providing a previous batch last block
        // that is greater than the window range.
        let dishonest: Vec<Header> = vec![
            header(0, b0_time - 1, 0),
            header(1, b0_time + 1000, 0),
            header(2, b0_time + 1001, 0),
        ];

        // A chain whose genesis falls inside the first window.
        let genesis_window: Vec<Header> =
            vec![header(0, a1_time, 0), header(1, a1_time + cfg.block_time, 0)];
        let late_genesis_window: Vec<Header> = vec![
            header(0, a1_time - 1, 0),
            header(1, a1_time, 0),
            header(2, a1_time + cfg.block_time, 0),
        ];

        // A stale suggested origin: the window opens long after the parent's origin plus the
        // max drift, so the origin must advance by one with an empty batch.
        let l2_d = l2_ref(110, l1_a.timestamp + 8, &l1_a, 4);
        let d_next = l2_d.block_info.timestamp + cfg.block_time;
        let stale_origin: Vec<Header> = vec![
            header(0, d_next - 1, 0),
            header(1, d_next, 0),
            header(2, d_next + cfg.block_time, 0),
        ];

        let cases = vec![
            ValidBatchTestCase {
                name: "valid batch where one espresso block falls within the window",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a0,
                inclusion_block: l1_a,
                headers: hotshot.clone(),
                batch: empty_batch(
                    l2_a0,
                    &l1_a,
                    a1_time,
                    justification(Some(&hotshot[0]), &[&hotshot[1]], &hotshot[2]),
                ),
                expected: BatchValidity::Accept,
            },
            ValidBatchTestCase {
                name: "valid batch where two espresso blocks fall within the window",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a1,
                inclusion_block: l1_a,
                headers: hotshot.clone(),
                batch: empty_batch(
                    l2_a1,
                    &l1_a,
                    a2_time,
                    justification(Some(&hotshot[1]), &[&hotshot[2], &hotshot[3]], &hotshot[4]),
                ),
                expected: BatchValidity::Accept,
            },
            ValidBatchTestCase {
                name: "valid batch where three espresso blocks fall within the window",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a2,
                inclusion_block: l1_a,
                headers: hotshot.clone(),
                batch: empty_batch(
                    l2_a2,
                    &l1_a,
                    a3_time,
                    justification(
                        Some(&hotshot[3]),
                        &[&hotshot[4], &hotshot[5], &hotshot[6]],
                        &hotshot[7],
                    ),
                ),
                expected: BatchValidity::Accept,
            },
            ValidBatchTestCase {
                name: "empty batch due to empty espresso window",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a0,
                inclusion_block: l1_a,
                headers: empty_window.clone(),
                batch: empty_batch(
                    l2_a0,
                    &l1_a,
                    a1_time,
                    justification(Some(&empty_window[0]), &[], &empty_window[1]),
                ),
                expected: BatchValidity::Accept,
            },
            ValidBatchTestCase {
                name: "valid batch where the espresso sequencer skips an L1 block",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a3,
                inclusion_block: l1_b,
                headers: skipped.clone(),
                batch: empty_batch(
                    l2_a3,
                    &l1_b,
                    b0_time,
                    justification(Some(&skipped[0]), &[&skipped[1]], &skipped[2]),
                ),
                expected: BatchValidity::Accept,
            },
            ValidBatchTestCase {
                name: "empty batch advances origin when the suggested origin is stale",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_d,
                inclusion_block: l1_b,
                headers: stale_origin.clone(),
                batch: empty_batch(
                    l2_d,
                    &l1_b,
                    d_next,
                    justification(Some(&stale_origin[0]), &[&stale_origin[1]], &stale_origin[2]),
                ),
                expected: BatchValidity::Accept,
            },
            ValidBatchTestCase {
                name: "invalid batch due to swapped bookend headers",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a3,
                inclusion_block: l1_b,
                headers: skipped.clone(),
                batch: empty_batch(
                    l2_a3,
                    &l1_b,
                    b0_time,
                    justification(Some(&skipped[1]), &[], &skipped[0]),
                ),
                expected: BatchValidity::Drop,
            },
            ValidBatchTestCase {
                name: "invalid batch due to a prev header outside of the window range",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a3,
                inclusion_block: l1_b,
                headers: dishonest.clone(),
                batch: empty_batch(
                    l2_a3,
                    &l1_b,
                    b0_time,
                    justification(Some(&dishonest[0]), &[&dishonest[1]], &dishonest[2]),
                ),
                expected: BatchValidity::Drop,
            },
            ValidBatchTestCase {
                name: "invalid batch that does not advance the origin over a skipped L1 block",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a3,
                inclusion_block: l1_b,
                headers: skipped.clone(),
                batch: empty_batch(
                    l2_a3,
                    &l1_a,
                    b0_time,
                    justification(Some(&skipped[0]), &[&skipped[1]], &skipped[2]),
                ),
                expected: BatchValidity::Drop,
            },
            ValidBatchTestCase {
                name: "invalid batch due to an espresso block outside of the window",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a0,
                inclusion_block: l1_a,
                headers: hotshot.clone(),
                batch: empty_batch(
                    l2_a0,
                    &l1_a,
                    a1_time,
                    // hotshot[2] is stamped at the window end and does not belong.
                    justification(Some(&hotshot[0]), &[&hotshot[1], &hotshot[2]], &hotshot[3]),
                ),
                expected: BatchValidity::Drop,
            },
            ValidBatchTestCase {
                name: "invalid batch due to lack of justification",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a3,
                inclusion_block: l1_b,
                headers: skipped.clone(),
                batch: empty_batch(l2_a3, &l1_b, b0_time, None),
                expected: BatchValidity::Drop,
            },
            ValidBatchTestCase {
                name: "undecided batch if headers are not available",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a3,
                inclusion_block: l1_a,
                headers: vec![],
                batch: empty_batch(
                    l2_a3,
                    &l1_a,
                    b0_time,
                    justification(Some(&empty_window[0]), &[], &empty_window[1]),
                ),
                expected: BatchValidity::Undecided,
            },
            ValidBatchTestCase {
                name: "valid batch over the espresso genesis window",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a0,
                inclusion_block: l1_a,
                headers: genesis_window.clone(),
                batch: empty_batch(
                    l2_a0,
                    &l1_a,
                    a1_time,
                    justification(None, &[&genesis_window[0]], &genesis_window[1]),
                ),
                expected: BatchValidity::Accept,
            },
            ValidBatchTestCase {
                name: "invalid batch omitting prev when the first block is not genesis",
                l1_blocks: l1_chain.clone(),
                l2_safe_head: l2_a0,
                inclusion_block: l1_a,
                headers: late_genesis_window.clone(),
                batch: empty_batch(
                    l2_a0,
                    &l1_a,
                    a1_time,
                    justification(None, &[&late_genesis_window[1]], &late_genesis_window[2]),
                ),
                expected: BatchValidity::Drop,
            },
        ];

        for case in cases {
            let mut l1 = TestEspressoL1Provider::with_blocks(case.l1_blocks.clone())
                .headers(case.headers.clone());
            let validity = case
                .batch
                .check_batch(
                    &cfg,
                    &sys_cfg,
                    &case.l1_blocks,
                    case.l2_safe_head,
                    &case.inclusion_block,
                    &mut l1,
                )
                .await;
            assert_eq!(validity, case.expected, "case: {}", case.name);
        }
    }

    #[tokio::test]
    async fn test_strict_timestamps_reject_disorder() {
        let (mut cfg, sys_cfg) = config();
        let l1_a = l1_block(0, 1000);
        let l1_chain = vec![l1_a, l1_block(1, 1007), l1_block(2, 1014)];
        let safe_head = l2_ref(100, l1_a.timestamp, &l1_a, 0);
        let next_time = safe_head.block_info.timestamp + cfg.block_time;

        // Two in-window blocks with decreasing timestamps.
        let headers = vec![
            header(0, next_time - 1, 0),
            header(1, next_time + 1, 0),
            header(2, next_time, 0),
            header(3, next_time + cfg.block_time, 0),
        ];
        let batch = empty_batch(
            safe_head,
            &l1_a,
            next_time,
            justification(Some(&headers[0]), &[&headers[1], &headers[2]], &headers[3]),
        );

        let mut l1 =
            TestEspressoL1Provider::with_blocks(l1_chain.clone()).headers(headers.clone());
        let validity = batch
            .check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &l1_a, &mut l1)
            .await;
        assert_eq!(validity, BatchValidity::Accept);

        cfg.strict_espresso_timestamps = true;
        let mut l1 = TestEspressoL1Provider::with_blocks(l1_chain.clone()).headers(headers);
        let validity = batch
            .check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &l1_a, &mut l1)
            .await;
        assert_eq!(validity, BatchValidity::Drop);
    }

    #[tokio::test]
    async fn test_generic_prechecks() {
        let (cfg, sys_cfg) = config();
        let l1_a = l1_block(0, 1000);
        let l1_b = l1_block(1, 1007);
        let l1_chain = vec![l1_a, l1_b];
        let safe_head = l2_ref(100, l1_a.timestamp, &l1_a, 0);
        let next_time = safe_head.block_info.timestamp + cfg.block_time;
        let mut l1 = TestEspressoL1Provider::with_blocks(l1_chain.clone());

        // Future batch.
        let batch = empty_batch(safe_head, &l1_a, next_time + cfg.block_time, None);
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Future);

        // Old timestamp.
        let batch = empty_batch(safe_head, &l1_a, safe_head.block_info.timestamp, None);
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Drop);

        // Wrong parent hash.
        let batch = SingleBatch {
            parent_hash: hash(0xEE),
            ..empty_batch(safe_head, &l1_a, next_time, None)
        };
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Drop);

        // Sequence window expired: included too late.
        let batch = empty_batch(safe_head, &l1_a, next_time, None);
        let late_inclusion = l1_block(cfg.seq_window_size + 1, 2000);
        let validity = batch
            .check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &late_inclusion, &mut l1)
            .await;
        assert_eq!(validity, BatchValidity::Drop);

        // Epoch advanced by one without the next L1 block supplied.
        let batch = empty_batch(safe_head, &l1_b, next_time, None);
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &l1_chain[..1], safe_head, &l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Undecided);

        // Epoch too far ahead.
        let far_epoch = l1_block(3, 2000);
        let batch = empty_batch(safe_head, &far_epoch, next_time, None);
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Drop);

        // Epoch hash mismatch.
        let mut wrong_hash = l1_a;
        wrong_hash.hash = hash(0xEF);
        let batch = empty_batch(safe_head, &wrong_hash, next_time, None);
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Drop);

        // Batch timestamp before its L1 origin's timestamp.
        let late_l1_a = BlockInfo { timestamp: next_time + 1, ..l1_a };
        let late_chain = vec![late_l1_a, l1_b];
        let batch = empty_batch(safe_head, &late_l1_a, next_time, None);
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &late_chain, safe_head, &late_l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Drop);

        // An empty transaction in the batch.
        let mut batch = empty_batch(safe_head, &l1_a, next_time, None);
        batch.transactions = vec![RawTransaction::default()];
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Drop);

        // A deposit transaction smuggled into the batch.
        let mut batch = empty_batch(safe_head, &l1_a, next_time, None);
        batch.transactions = vec![RawTransaction([crate::types::DEPOSIT_TX_TYPE].into())];
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &l1_chain, safe_head, &l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Drop);

        // Espresso disabled: the batch is accepted without a justification.
        let native = SystemConfig { espresso: false, ..sys_cfg };
        let batch = empty_batch(safe_head, &l1_a, next_time, None);
        let validity =
            batch.check_batch(&cfg, &native, &l1_chain, safe_head, &l1_a, &mut l1).await;
        assert_eq!(validity, BatchValidity::Accept);
    }

    #[tokio::test]
    async fn test_drift_guard_espresso_always_allows_empty_batch() {
        let (cfg, sys_cfg) = config();
        // The next L1 origin's timestamp has already passed, so a native sequencer would have
        // been required to adopt it. Espresso may still produce an empty batch on the old
        // epoch when the external sequencer's suggested origin briefly decreased.
        let l1_a = l1_block(0, 1000);
        let l1_b = l1_block(1, 1002);
        let l1_c = l1_block(2, 1004);
        let all_blocks = vec![l1_a, l1_b, l1_c];
        let l1_context = vec![l1_b, l1_c];
        let safe_head = l2_ref(100, 1008, &l1_b, 3);
        let next_time = safe_head.block_info.timestamp + cfg.block_time;
        assert!(next_time > l1_b.timestamp + cfg.max_sequencer_drift);
        assert!(next_time >= l1_c.timestamp);

        // The empty window's trailing bookend suggests an L1 head *behind* the parent's
        // origin, so the deterministic origin selection keeps the old epoch.
        let headers = vec![header(0, next_time - 1, 0), header(1, next_time + 1000, 0)];
        let batch = empty_batch(
            safe_head,
            &l1_b,
            next_time,
            justification(Some(&headers[0]), &[], &headers[1]),
        );

        // Native mode drops the batch: the next origin would have been valid.
        let native = SystemConfig { espresso: false, ..sys_cfg };
        let mut l1 =
            TestEspressoL1Provider::with_blocks(all_blocks.clone()).headers(headers.clone());
        let validity =
            batch.check_batch(&cfg, &native, &l1_context, safe_head, &l1_b, &mut l1).await;
        assert_eq!(validity, BatchValidity::Drop);

        // Espresso mode lets the empty batch through the drift guard.
        let mut l1 = TestEspressoL1Provider::with_blocks(all_blocks).headers(headers);
        let validity =
            batch.check_batch(&cfg, &sys_cfg, &l1_context, safe_head, &l1_b, &mut l1).await;
        assert_eq!(validity, BatchValidity::Accept);
    }
}
