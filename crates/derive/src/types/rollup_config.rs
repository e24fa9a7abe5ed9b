//! This module contains the [RollupConfig] type.

use super::Genesis;

/// The Rollup configuration.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollupConfig {
    /// The genesis state of the rollup.
    pub genesis: Genesis,
    /// The block time of the L2, in seconds.
    pub block_time: u64,
    /// Sequencer batches may not be more than `max_sequencer_drift` seconds after
    /// the L1 timestamp of their L1 origin.
    ///
    /// Note: When L1 has many 1 second consecutive blocks, and L2 grows at fixed 2 seconds,
    /// the L2 time may still grow beyond this difference.
    pub max_sequencer_drift: u64,
    /// The sequencer window size: the maximum number of L1 blocks between a batch's epoch and
    /// its L1 inclusion block before the batch expires.
    pub seq_window_size: u64,
    /// The L1 chain ID
    pub l1_chain_id: u64,
    /// The L2 chain ID. Doubles as the rollup's namespace id in the Espresso
    /// namespaced Merkle tree.
    pub l2_chain_id: u64,
    /// `regolith_time` sets the activation time of the Regolith network-upgrade.
    /// Active if `regolith_time` != None && L2 block timestamp >= Some(regolith_time),
    /// inactive otherwise.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub regolith_time: Option<u64>,
    /// `ecotone_time` sets the activation time of the Ecotone network upgrade.
    /// Active if `ecotone_time` != None && L2 block timestamp >= Some(ecotone_time),
    /// inactive otherwise.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub ecotone_time: Option<u64>,
    /// Whether out-of-order Espresso header timestamps inside a sequencing
    /// window invalidate a batch. The sequencer does not guarantee strictly
    /// monotone timestamps, so the default is to log and tolerate them.
    pub strict_espresso_timestamps: bool,
}

impl RollupConfig {
    /// Returns true if Regolith is active at the given timestamp.
    pub fn is_regolith_active(&self, timestamp: u64) -> bool {
        self.regolith_time.is_some_and(|t| timestamp >= t)
    }

    /// Returns true if Ecotone is active at the given timestamp.
    pub fn is_ecotone_active(&self, timestamp: u64) -> bool {
        self.ecotone_time.is_some_and(|t| timestamp >= t)
    }

    /// Returns true if the given timestamp is the Ecotone activation block.
    ///
    /// The activation block itself still carries the previous fork's L1 info
    /// transaction, because the L1 block contract is only upgraded by the
    /// network upgrade transactions placed after it.
    pub fn is_ecotone_activation_block(&self, timestamp: u64) -> bool {
        self.ecotone_time == Some(timestamp)
    }

    /// Returns the rollup's namespace id in the Espresso NMT.
    pub const fn espresso_namespace(&self) -> u64 {
        self.l2_chain_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecotone_activation() {
        let cfg = RollupConfig { ecotone_time: Some(10), ..Default::default() };
        assert!(!cfg.is_ecotone_active(9));
        assert!(cfg.is_ecotone_active(10));
        assert!(cfg.is_ecotone_activation_block(10));
        assert!(!cfg.is_ecotone_activation_block(12));

        let cfg = RollupConfig::default();
        assert!(!cfg.is_ecotone_active(u64::MAX));
        assert!(!cfg.is_regolith_active(u64::MAX));
    }
}
