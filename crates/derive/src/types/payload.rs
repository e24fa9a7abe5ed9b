//! Contains the execution payload type consumed from the engine.

use super::RawTransaction;
use alloc::vec::Vec;
use alloy_primitives::{B256, B64};

/// An eight-byte identifier for a payload build job.
pub type PayloadId = B64;

/// A minimal view of an executed L2 payload, as returned by the engine when a
/// block building job is confirmed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionPayload {
    /// The hash of the parent block.
    pub parent_hash: B256,
    /// The hash of this block.
    pub block_hash: B256,
    /// The number of this block.
    pub block_number: u64,
    /// The timestamp of this block.
    pub timestamp: u64,
    /// The transactions executed in this block, in order.
    pub transactions: Vec<RawTransaction>,
}

impl ExecutionPayload {
    /// Returns the block ID of the payload.
    pub fn id(&self) -> super::BlockID {
        super::BlockID { hash: self.block_hash, number: self.block_number }
    }
}
