//! This module contains the [SingleBatch] type and its validation rules.

use super::{BatchValidity, BlockInfo, Justification, L2BlockInfo, RawTransaction, RollupConfig};
use crate::{espresso::check_batch_espresso, traits::EspressoL1Provider, types::SystemConfig};
use alloc::vec::Vec;
use alloy_primitives::BlockHash;
use alloy_rlp::{Decodable, Encodable, EMPTY_LIST_CODE};

/// Represents a single batch: a single encoded L2 block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SingleBatch {
    /// Block hash of the previous L2 block
    pub parent_hash: BlockHash,
    /// The batch epoch number. Same as the first L1 block number in the epoch.
    pub epoch_num: u64,
    /// The block hash of the first L1 block in the epoch
    pub epoch_hash: BlockHash,
    /// The L2 block timestamp of this batch
    pub timestamp: u64,
    /// The L2 block transactions in this batch
    pub transactions: Vec<RawTransaction>,
    /// In Espresso mode, the evidence that the external sequencer endorsed
    /// exactly these transactions over this batch's sequencing window.
    pub justification: Option<Justification>,
}

impl Encodable for SingleBatch {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        let payload_length = self.rlp_payload_length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.parent_hash.encode(out);
        self.epoch_num.encode(out);
        self.epoch_hash.encode(out);
        self.timestamp.encode(out);
        self.transactions.encode(out);
        match &self.justification {
            Some(justification) => justification.encode(out),
            None => out.put_u8(EMPTY_LIST_CODE),
        }
    }
    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl SingleBatch {
    fn rlp_payload_length(&self) -> usize {
        self.parent_hash.length()
            + self.epoch_num.length()
            + self.epoch_hash.length()
            + self.timestamp.length()
            + self.transactions.length()
            + self.justification.as_ref().map_or(1, Encodable::length)
    }
}

impl Decodable for SingleBatch {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut body = alloy_rlp::Header::decode_bytes(buf, true)?;
        let parent_hash = BlockHash::decode(&mut body)?;
        let epoch_num = u64::decode(&mut body)?;
        let epoch_hash = BlockHash::decode(&mut body)?;
        let timestamp = u64::decode(&mut body)?;
        let transactions = Vec::<RawTransaction>::decode(&mut body)?;
        let justification = if body.first() == Some(&EMPTY_LIST_CODE) {
            body = &body[1..];
            None
        } else {
            Some(Justification::decode(&mut body)?)
        };
        Ok(Self { parent_hash, epoch_num, epoch_hash, timestamp, transactions, justification })
    }
}

impl SingleBatch {
    /// If any transactions are empty or deposited transaction types.
    pub fn has_invalid_transactions(&self) -> bool {
        self.transactions.iter().any(|tx| tx.is_empty() || tx.is_deposit())
    }

    /// Checks if the batch can be applied on top of the given L2 safe head, given the contextual
    /// L1 blocks the batch was included in. The first entry of `l1_blocks` must match the L1
    /// origin of the safe head; one or more consecutive L1 blocks should be provided. In case of
    /// only a single L1 block, the decision whether a batch is valid may have to stay undecided.
    pub async fn check_batch<P: EspressoL1Provider + Send>(
        &self,
        cfg: &RollupConfig,
        sys_cfg: &SystemConfig,
        l1_blocks: &[BlockInfo],
        l2_safe_head: L2BlockInfo,
        inclusion_block: &BlockInfo,
        l1: &mut P,
    ) -> BatchValidity {
        // Sanity check input consistency
        if l1_blocks.is_empty() {
            warn!(target: "batch-validator", "missing L1 block input, cannot proceed with batch checking");
            return BatchValidity::Undecided;
        }

        let epoch = l1_blocks[0];
        let next_timestamp = l2_safe_head.block_info.timestamp + cfg.block_time;
        if self.timestamp > next_timestamp {
            trace!(
                target: "batch-validator",
                "received out-of-order batch for future processing after next batch, next timestamp: {next_timestamp}"
            );
            return BatchValidity::Future;
        }
        if self.timestamp < next_timestamp {
            warn!(target: "batch-validator", "dropping batch with old timestamp, minimum: {next_timestamp}");
            return BatchValidity::Drop;
        }

        // Dependent on the above timestamp check.
        // If the timestamp is correct, then it must build on top of the safe head.
        if self.parent_hash != l2_safe_head.block_info.hash {
            warn!(
                target: "batch-validator",
                "ignoring batch with mismatching parent hash, current safe head: {}",
                l2_safe_head.block_info.hash
            );
            return BatchValidity::Drop;
        }

        // Filter out batches that were included too late.
        if self.epoch_num + cfg.seq_window_size < inclusion_block.number {
            warn!(target: "batch-validator", "batch was included too late, sequence window expired");
            return BatchValidity::Drop;
        }

        // Check the L1 origin of the batch
        let mut batch_origin = epoch;
        if self.epoch_num < epoch.number {
            warn!(target: "batch-validator", "dropped batch, epoch is too old, minimum: {}", epoch.id());
            return BatchValidity::Drop;
        } else if self.epoch_num == epoch.number {
            // Batch is sticking to the current epoch, continue.
        } else if self.epoch_num == epoch.number + 1 {
            // With only 1 l1 block we cannot look at the next L1 origin.
            // Note: This means that we are unable to determine validity of a batch
            // without more information. In this case we should bail out until we have
            // more information otherwise the eager algorithm may diverge from a non-eager
            // algorithm.
            if l1_blocks.len() < 2 {
                info!(
                    target: "batch-validator",
                    "eager batch wants to advance epoch, but could not without more L1 blocks, current epoch: {}",
                    epoch.id()
                );
                return BatchValidity::Undecided;
            }
            batch_origin = l1_blocks[1];
        } else {
            warn!(
                target: "batch-validator",
                "batch is for future epoch too far ahead, while it has the next timestamp, so it must be invalid"
            );
            return BatchValidity::Drop;
        }

        // Validate the batch epoch hash
        if self.epoch_hash != batch_origin.hash {
            warn!(
                target: "batch-validator",
                "batch is for different L1 chain, epoch hash does not match, expected: {}",
                batch_origin.id()
            );
            return BatchValidity::Drop;
        }

        if self.timestamp < batch_origin.timestamp {
            warn!(
                target: "batch-validator",
                "batch timestamp {} is less than L1 origin timestamp {}",
                self.timestamp,
                batch_origin.timestamp
            );
            return BatchValidity::Drop;
        }

        // Check if we ran out of sequencer time drift
        let max_drift_timestamp = batch_origin.timestamp + cfg.max_sequencer_drift;
        if self.timestamp > max_drift_timestamp {
            if !self.transactions.is_empty() {
                // If the sequencer is ignoring the time drift rule, then drop the batch and
                // force an empty batch instead, as the sequencer is not allowed to include
                // anything past this point without moving to the next epoch.
                warn!(
                    target: "batch-validator",
                    "batch exceeded sequencer time drift, sequencer must adopt new L1 origin to include transactions again, max time: {max_drift_timestamp}"
                );
                return BatchValidity::Drop;
            }
            // The sequencer is co-operating by producing an empty batch. Allow it if that was
            // the right thing to do to maintain the L2 time >= L1 time invariant. Only batches
            // that do not advance the epoch need the check; epoch advancement regardless of
            // time drift is always allowed.
            if epoch.number == batch_origin.number {
                if l1_blocks.len() < 2 {
                    info!(
                        target: "batch-validator",
                        "without the next L1 origin we cannot determine yet if this empty batch that exceeds the time drift is still valid"
                    );
                    return BatchValidity::Undecided;
                }
                let next_origin = l1_blocks[1];
                // When Espresso is sequencing, the sequencer cannot adopt the next origin in
                // the case that the external sequencer failed to produce blocks, so the empty
                // batch is always allowed.
                if !sys_cfg.espresso && self.timestamp >= next_origin.timestamp {
                    info!(
                        target: "batch-validator",
                        "batch exceeded sequencer time drift without adopting next origin, and next L1 origin would have been valid"
                    );
                    return BatchValidity::Drop;
                }
                info!(
                    target: "batch-validator",
                    "continuing with empty batch before late L1 block to preserve L2 time invariant"
                );
            }
        }

        // We can do this check earlier, but it's a more intensive one, so we do this last.
        for (i, tx) in self.transactions.iter().enumerate() {
            if tx.is_empty() {
                warn!(
                    target: "batch-validator",
                    "transaction data must not be empty, but found empty tx at index {i}"
                );
                return BatchValidity::Drop;
            }
            if tx.is_deposit() {
                warn!(
                    target: "batch-validator",
                    "sequencers may not embed any deposits into batch data, but found tx that has one at index {i}"
                );
                return BatchValidity::Drop;
            }
        }

        if sys_cfg.espresso {
            check_batch_espresso(cfg, sys_cfg, l2_safe_head, self, l1).await
        } else {
            BatchValidity::Accept
        }
    }
}

/// A batch with its L1 inclusion block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchWithInclusionBlock {
    /// The inclusion block
    pub inclusion_block: BlockInfo,
    /// The batch
    pub batch: SingleBatch,
}

impl BatchWithInclusionBlock {
    /// Validates the batch can be applied on top of the specified L2 safe head.
    pub async fn check_batch<P: EspressoL1Provider + Send>(
        &self,
        cfg: &RollupConfig,
        sys_cfg: &SystemConfig,
        l1_blocks: &[BlockInfo],
        l2_safe_head: L2BlockInfo,
        l1: &mut P,
    ) -> BatchValidity {
        self.batch
            .check_batch(cfg, sys_cfg, l1_blocks, l2_safe_head, &self.inclusion_block, l1)
            .await
    }
}
