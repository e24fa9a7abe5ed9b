//! Deterministic L1 origin selection for L2 blocks sequenced by Espresso.

use crate::{
    errors::PipelineResult,
    traits::EspressoL1Provider,
    types::{BlockInfo, L2BlockInfo, RollupConfig, SystemConfig},
};

/// Finds the L1 origin required of an L2 block built on `parent` when running in Espresso mode.
/// `suggested` is the L1 origin "suggested" by the Espresso Sequencer: the L1 head referenced by
/// the first Espresso block after the end of the sequencing window for this L2 block.
///
/// First, `suggested` is adjusted by the configured L1 confirmation depth, so that an L1 block is
/// only used once it has a certain number of confirmations. If the result is a valid L1 origin
/// according to the rules of the derivation pipeline (it is not too old for the L2 batch, it did
/// not skip an L1 block from `parent.l1_origin`, and so on) it is returned. Otherwise a different
/// L1 origin is selected _deterministically_ to conform with the constraints of the pipeline. The
/// resulting origin is always the parent's or the one after the parent's, and is a pure function
/// of `parent`, `suggested`, the config, and the L1 chain state read through `l1` — the sequencer
/// and the verifier both call this and must reach identical conclusions.
pub async fn espresso_l1_origin<P: EspressoL1Provider + Send>(
    cfg: &RollupConfig,
    sys_cfg: &SystemConfig,
    parent: L2BlockInfo,
    suggested: u64,
    l1: &mut P,
) -> PipelineResult<BlockInfo> {
    // The Espresso Sequencer always suggests the latest L1 block it has seen, which makes the
    // suggestion as-is highly sensitive to L1 reorgs. Lagging the suggestion by a confirmation
    // depth keeps derivation deterministic while only adopting L1 blocks with a minimum number
    // of confirmations.
    let suggested = suggested.saturating_sub(sys_cfg.espresso_l1_conf_depth);

    let prev = parent.l1_origin;
    let window_start = parent.block_info.timestamp + cfg.block_time;

    // Constraint 1: the L1 origin must not skip an L1 block.
    if suggested > prev.number + 1 {
        let next_l1_block = l1.l1_block_ref_by_number(prev.number + 1).await?;
        // A skipped L1 block is Espresso telling us that multiple new L1 blocks have already
        // been produced. Fetching the next L1 origin will not block, so advance as far as the
        // derivation pipeline allows: one block.
        if next_l1_block.timestamp <= window_start {
            info!(
                target: "l1-origin",
                "skipped an L1 block and the next L1 block is eligible as an origin, advancing by one"
            );
            return Ok(next_l1_block);
        }
        info!(
            target: "l1-origin",
            "skipped an L1 block and the next L1 block is not eligible as an origin, using the old origin"
        );
        return l1.l1_block_ref_by_number(prev.number).await;
    }

    // Constraint 2: the L1 origin number decreased.
    //
    // While Espresso _should_ guarantee that L1 origin numbers are monotonically increasing, a
    // limitation in the current design means that on rare occasions the L1 origin number can
    // decrease. There is no indication that new L1 blocks are ready, so reuse the previous
    // origin rather than forcing the pipeline to block on a new one.
    if suggested < prev.number {
        warn!(target: "l1-origin", "L1 origin decreased from {} to {suggested}, using the old origin", prev.number);
        return l1.l1_block_ref_by_number(prev.number).await;
    }

    // Fetch information about the suggested L1 block needed to evaluate the rest of the
    // constraints.
    let l1_block = l1.l1_block_ref_by_number(suggested).await?;

    // Constraint 3: the L1 origin is too old.
    if l1_block.timestamp + cfg.max_sequencer_drift < window_start {
        // Here we are forced to advance the L1 origin. At worst, the derivation pipeline may
        // block until the next L1 origin is available, but if the chosen L1 origin is this old,
        // a new L1 block almost certainly exists and Espresso just hasn't seen it yet.
        info!(
            target: "l1-origin",
            "L1 origin {} is too old, advancing by one", l1_block.id()
        );
        return l1.l1_block_ref_by_number(prev.number + 1).await;
    }

    // Constraint 4: the L1 origin must not be newer than the L2 batch. In this case Espresso is
    // running ahead of the L2, which is fine; wait to advance the L1 origin until the L2 chain
    // catches up.
    if l1_block.timestamp > window_start {
        info!(target: "l1-origin", "L1 origin is newer than the L2 batch, using the previous origin");
        return l1.l1_block_ref_by_number(prev.number).await;
    }

    // In all other cases, the suggested L1 origin is valid.
    Ok(l1_block)
}

/// Whether an L2 batch with the given L1 origin and timestamp is required to be empty.
///
/// The constraints of the derivation pipeline require that if the L2 has fallen behind the L1 and
/// is catching up, it must produce empty batches.
pub fn espresso_batch_must_be_empty(
    cfg: &RollupConfig,
    l1_origin: &BlockInfo,
    timestamp: u64,
) -> bool {
    l1_origin.timestamp + cfg.max_sequencer_drift < timestamp
}
