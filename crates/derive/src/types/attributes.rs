//! Contains Payload Attribute Types.

use super::{Justification, RawTransaction};
use alloc::vec::Vec;
use alloy_primitives::{Address, B256};

/// Payload attributes for a block building job.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PayloadAttributes {
    /// Value for the timestamp field of the new payload.
    pub timestamp: u64,
    /// Value for the random field of the new payload.
    pub prev_randao: B256,
    /// Suggested value for the coinbase field of the new payload.
    pub fee_recipient: Address,
    /// Transactions to force into the block (always at the start of the transactions list).
    pub transactions: Vec<RawTransaction>,
    /// NoTxPool to disable adding any transactions from the transaction-pool.
    pub no_tx_pool: bool,
    /// GasLimit override.
    pub gas_limit: Option<u64>,
    /// In Espresso mode, the justification carried by this block's L1-info
    /// deposit transaction.
    pub justification: Option<Justification>,
}
