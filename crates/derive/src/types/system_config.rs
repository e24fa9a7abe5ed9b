//! This module contains the [SystemConfig] type.

use alloy_primitives::{Address, U256};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// System configuration values, as stored in the L1 system config contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemConfig {
    /// Batch sender address
    pub batcher_address: Address,
    /// Fee overhead for L1 data. Ignored after the Ecotone upgrade.
    pub overhead: U256,
    /// Fee scalar for L1 data
    pub scalar: U256,
    /// L2 gas limit
    pub gas_limit: u64,
    /// Whether the Espresso Sequencer orders L2 transactions. When unset the
    /// rollup sequences with its native first-come-first-served rules.
    pub espresso: bool,
    /// The number of L1 confirmations an Espresso-suggested L1 origin must
    /// have before the derivation pipeline adopts it.
    pub espresso_l1_conf_depth: u64,
}
