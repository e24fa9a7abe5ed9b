//! This module contains all of the types used within the derivation core.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use alloy_primitives::Bytes;
use alloy_rlp::{Decodable, Encodable};

mod attributes;
pub use attributes::PayloadAttributes;

mod system_config;
pub use system_config::SystemConfig;

mod rollup_config;
pub use rollup_config::RollupConfig;

mod validity;
pub use validity::BatchValidity;

mod justification;
pub use justification::{
    decode_justification, encode_justification, BlockJustification, Justification,
};

mod single_batch;
pub use single_batch::{BatchWithInclusionBlock, SingleBatch};

mod deposits;
pub use deposits::{L1InfoDepositSource, TxDeposit};

mod payload;
pub use payload::{ExecutionPayload, PayloadId};

mod block;
pub use block::{BlockID, BlockInfo, L2BlockInfo};

mod genesis;
pub use genesis::Genesis;

/// The transaction type byte of an OP deposit transaction.
pub const DEPOSIT_TX_TYPE: u8 = 0x7E;

/// A raw transaction
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawTransaction(pub Bytes);

impl RawTransaction {
    /// Returns if the transaction is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns if the transaction is a deposit
    pub fn is_deposit(&self) -> bool {
        !self.0.is_empty() && self.0[0] == DEPOSIT_TX_TYPE
    }
}

impl Encodable for RawTransaction {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.0.encode(out)
    }
    fn length(&self) -> usize {
        self.0.length()
    }
}

impl Decodable for RawTransaction {
    /// Decodes RLP encoded bytes into [RawTransaction] bytes
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let tx_bytes = Bytes::decode(buf)?;
        Ok(Self(tx_bytes))
    }
}

impl AsRef<[u8]> for RawTransaction {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for RawTransaction {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}
