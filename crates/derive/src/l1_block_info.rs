//! This module contains the L1-info transaction types, and the encoding /
//! decoding of their calldata. The L1-info deposit transaction sits at the
//! top of every L2 block; in Espresso mode its calldata additionally carries
//! the RLP-encoded batch justification and the Espresso system parameters.

use crate::types::{
    decode_justification, encode_justification, Justification, L1InfoDepositSource, RollupConfig,
    SystemConfig, TxDeposit,
};
use alloc::vec::Vec;
use alloy_primitives::{address, Address, Bytes, TxKind, B256, U256};

/// The type byte identifier for the L1 scalar format in Ecotone.
const L1_SCALAR_ECOTONE: u8 = 1;
/// The system transaction gas limit post-Regolith.
const REGOLITH_SYSTEM_TX_GAS: u64 = 1_000_000;
/// The address of the L1 Block contract.
const L1_BLOCK_ADDRESS: Address = address!("4200000000000000000000000000000000000015");
/// The depositor address of the L1 info transaction.
const L1_INFO_DEPOSITOR_ADDRESS: Address = address!("deaddeaddeaddeaddeaddeaddeaddeaddead0001");
/// The fixed length of the static section of a Bedrock L1 info transaction:
/// the selector, the struct-fields offset word, ten field words, and the
/// justification offset word.
const L1_INFO_TX_STATIC_LEN_BEDROCK: usize = 4 + 32 * 12;
/// The fixed length of an Ecotone L1 info transaction, up to the
/// justification tail.
const L1_INFO_TX_STATIC_LEN_ECOTONE: usize = 4 + 4 + 4 + 8 + 8 + 8 + 32 + 32 + 32 + 32 + 8 + 8;
/// The ABI offset of the justification bytes within the Bedrock struct
/// encoding: the eleven words of the static struct section.
const L1_INFO_JUSTIFICATION_OFFSET_BEDROCK: u64 = 352;
/// The 4 byte selector of
/// "setL1BlockValues((uint64,uint64,uint256,bytes32,uint64,bytes32,uint256,uint256,bool,uint64,bytes))"
const L1_INFO_TX_SELECTOR_BEDROCK: [u8; 4] = [0x54, 0xb7, 0x32, 0x5c];
/// The 4 byte selector of "setL1BlockValuesEcotone()"
const L1_INFO_TX_SELECTOR_ECOTONE: [u8; 4] = [0x44, 0x0a, 0x5e, 0x20];

/// An error decoding or encoding an L1 info transaction.
#[derive(derive_more::Display, Debug, Clone, PartialEq, Eq)]
pub enum L1InfoTxError {
    /// The calldata does not start with a known selector.
    #[display("Invalid L1 info transaction selector")]
    InvalidSelector,
    /// The calldata is too short for its layout.
    #[display("Invalid calldata length for L1 info transaction")]
    InvalidLength,
    /// The ABI struct-fields offset is not the expected constant.
    #[display("Invalid struct fields offset: {_0}")]
    InvalidFieldsOffset(u64),
    /// The ABI offset of the justification bytes is not the expected constant.
    #[display("Invalid justification offset: {_0}")]
    InvalidJustificationOffset(u64),
    /// The ABI padding of the justification bytes is not zero.
    #[display("Non-zero padding after justification bytes")]
    NonZeroPadding,
    /// The calldata has bytes beyond its layout.
    #[display("Too many bytes in L1 info transaction calldata")]
    TrailingData,
    /// The justification tail failed to RLP-decode.
    #[display("Justification RLP error: {_0}")]
    Rlp(alloy_rlp::Error),
}

impl core::error::Error for L1InfoTxError {}

impl From<alloy_rlp::Error> for L1InfoTxError {
    fn from(err: alloy_rlp::Error) -> Self {
        Self::Rlp(err)
    }
}

/// The [L1BlockInfoTx] enum contains variants for the different versions of
/// the L1 block info transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum L1BlockInfoTx {
    /// A Bedrock L1 info transaction
    Bedrock(L1BlockInfoBedrock),
    /// An Ecotone L1 info transaction
    Ecotone(L1BlockInfoEcotone),
}

/// Represents the fields within a Bedrock L1 block info transaction.
///
/// The calldata is the ABI encoding of a call to `setL1BlockValues`, whose
/// single argument is a struct holding all fields. The struct encodes as a
/// dynamic tuple: an offset word, the static fields in order, the offset of
/// the `bytes` justification, then the justification payload itself.
///
/// Bedrock Binary Format
// +---------+--------------------------+
// | Bytes   | Field                    |
// +---------+--------------------------+
// | 4       | Function signature       |
// | 32      | Struct fields offset (32)|
// | 32      | Number                   |
// | 32      | Time                     |
// | 32      | BaseFee                  |
// | 32      | BlockHash                |
// | 32      | SequenceNumber           |
// | 32      | BatcherHash              |
// | 32      | L1FeeOverhead            |
// | 32      | L1FeeScalar              |
// | 32      | Espresso                 |
// | 32      | EspressoL1ConfDepth      |
// | 32      | JustificationOffset (352)|
// | variable| Justification            |
// +---------+--------------------------+
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct L1BlockInfoBedrock {
    /// The current L1 origin block number
    pub number: u64,
    /// The current L1 origin block's timestamp
    pub time: u64,
    /// The current L1 origin block's basefee
    pub base_fee: u64,
    /// The current L1 origin block's hash
    pub block_hash: B256,
    /// The current sequence number
    pub sequence_number: u64,
    /// The address of the batch submitter
    pub batcher_address: Address,
    /// The fee overhead for L1 data
    pub l1_fee_overhead: U256,
    /// The fee scalar for L1 data
    pub l1_fee_scalar: U256,
    /// Whether Espresso mode is enabled
    pub espresso: bool,
    /// When using Espresso, the configured confirmation depth for L1 origins
    pub espresso_l1_conf_depth: u64,
    /// In Espresso mode, the justification for this block's batch
    pub justification: Option<Justification>,
}

/// Represents the fields within an Ecotone L1 block info transaction.
///
/// Ecotone Binary Format
/// +---------+--------------------------+
/// | Bytes   | Field                    |
/// +---------+--------------------------+
/// | 4       | Function signature       |
/// | 4       | BaseFeeScalar            |
/// | 4       | BlobBaseFeeScalar        |
/// | 8       | SequenceNumber           |
/// | 8       | Timestamp                |
/// | 8       | L1BlockNumber            |
/// | 32      | BaseFee                  |
/// | 32      | BlobBaseFee              |
/// | 32      | BlockHash                |
/// | 32      | BatcherHash              |
/// | 8       | EspressoL1ConfDepth      |
/// | 8       | Espresso                 |
/// | variable| Justification            |
/// +---------+--------------------------+
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct L1BlockInfoEcotone {
    /// The current L1 origin block number
    pub number: u64,
    /// The current L1 origin block's timestamp
    pub time: u64,
    /// The current L1 origin block's basefee
    pub base_fee: u64,
    /// The current L1 origin block's hash
    pub block_hash: B256,
    /// The current sequence number
    pub sequence_number: u64,
    /// The address of the batch submitter
    pub batcher_address: Address,
    /// The current blob base fee on L1
    pub blob_base_fee: u128,
    /// The fee scalar for L1 blobspace data
    pub blob_base_fee_scalar: u32,
    /// The fee scalar for L1 data
    pub base_fee_scalar: u32,
    /// Whether Espresso mode is enabled
    pub espresso: bool,
    /// When using Espresso, the configured confirmation depth for L1 origins
    pub espresso_l1_conf_depth: u64,
    /// In Espresso mode, the justification for this block's batch
    pub justification: Option<Justification>,
}

/// Returns whether the block at the given L2 timestamp is subject to the
/// Ecotone calldata layout: Ecotone is active and the block is not the
/// activation block itself. The layout never depends on the justification's
/// own contents.
fn is_ecotone_but_not_first_block(cfg: &RollupConfig, l2_block_time: u64) -> bool {
    cfg.is_ecotone_active(l2_block_time) && !cfg.is_ecotone_activation_block(l2_block_time)
}

impl L1BlockInfoTx {
    /// Creates a new [L1BlockInfoTx] for the given L1 block and L2 block
    /// time, selecting the calldata layout by the active fork.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        rollup_config: &RollupConfig,
        system_config: &SystemConfig,
        sequence_number: u64,
        l1_block: &crate::types::BlockInfo,
        base_fee: u64,
        blob_base_fee: Option<u128>,
        l2_block_time: u64,
        justification: Option<Justification>,
    ) -> Result<Self, L1InfoTxError> {
        if is_ecotone_but_not_first_block(rollup_config, l2_block_time) {
            let scalar = system_config.scalar.to_be_bytes::<32>();
            let blob_base_fee_scalar = (scalar[0] == L1_SCALAR_ECOTONE)
                .then(|| {
                    scalar[24..28]
                        .try_into()
                        .map(u32::from_be_bytes)
                        .map_err(|_| L1InfoTxError::InvalidLength)
                })
                .transpose()?
                .unwrap_or_default();
            let base_fee_scalar = u32::from_be_bytes(
                scalar[28..32].try_into().map_err(|_| L1InfoTxError::InvalidLength)?,
            );
            Ok(Self::Ecotone(L1BlockInfoEcotone {
                number: l1_block.number,
                time: l1_block.timestamp,
                base_fee,
                block_hash: l1_block.hash,
                sequence_number,
                batcher_address: system_config.batcher_address,
                // The minimum blob base fee from EIP-4844, when blobs are not yet active on L1.
                blob_base_fee: blob_base_fee.unwrap_or(1),
                blob_base_fee_scalar,
                base_fee_scalar,
                espresso: system_config.espresso,
                espresso_l1_conf_depth: system_config.espresso_l1_conf_depth,
                justification,
            }))
        } else {
            Ok(Self::Bedrock(L1BlockInfoBedrock {
                number: l1_block.number,
                time: l1_block.timestamp,
                base_fee,
                block_hash: l1_block.hash,
                sequence_number,
                batcher_address: system_config.batcher_address,
                l1_fee_overhead: system_config.overhead,
                l1_fee_scalar: system_config.scalar,
                espresso: system_config.espresso,
                espresso_l1_conf_depth: system_config.espresso_l1_conf_depth,
                justification,
            }))
        }
    }

    /// Creates a new [L1BlockInfoTx] and returns the deposit transaction
    /// that carries it at the top of the L2 block.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new_with_deposit_tx(
        rollup_config: &RollupConfig,
        system_config: &SystemConfig,
        sequence_number: u64,
        l1_block: &crate::types::BlockInfo,
        base_fee: u64,
        blob_base_fee: Option<u128>,
        l2_block_time: u64,
        justification: Option<Justification>,
    ) -> Result<(Self, TxDeposit), L1InfoTxError> {
        let l1_info = Self::try_new(
            rollup_config,
            system_config,
            sequence_number,
            l1_block,
            base_fee,
            blob_base_fee,
            l2_block_time,
            justification,
        )?;

        let source = L1InfoDepositSource::new(l1_block.hash, sequence_number);
        let mut deposit_tx = TxDeposit {
            source_hash: source.source_hash(),
            from: L1_INFO_DEPOSITOR_ADDRESS,
            to: TxKind::Call(L1_BLOCK_ADDRESS),
            mint: None,
            value: U256::ZERO,
            // A very large gas limit, combined with `is_system_transaction`, ensures the L1
            // attributes transaction does not run out of gas.
            gas_limit: 150_000_000,
            is_system_transaction: true,
            input: l1_info.encode_calldata(),
        };
        // With the Regolith hardfork, system transactions are deprecated and the L1 info
        // transaction is allocated a constant amount of real gas.
        if rollup_config.is_regolith_active(l2_block_time) {
            deposit_tx.is_system_transaction = false;
            deposit_tx.gas_limit = REGOLITH_SYSTEM_TX_GAS;
        }

        Ok((l1_info, deposit_tx))
    }

    /// Decodes the [L1BlockInfoTx] object from ethereum transaction calldata.
    pub fn decode_calldata(r: &[u8]) -> Result<Self, L1InfoTxError> {
        if r.len() < 4 {
            return Err(L1InfoTxError::InvalidLength);
        }
        let selector: [u8; 4] = r[0..4].try_into().map_err(|_| L1InfoTxError::InvalidLength)?;
        match selector {
            L1_INFO_TX_SELECTOR_BEDROCK => {
                Ok(Self::Bedrock(L1BlockInfoBedrock::decode_calldata(r)?))
            }
            L1_INFO_TX_SELECTOR_ECOTONE => {
                Ok(Self::Ecotone(L1BlockInfoEcotone::decode_calldata(r)?))
            }
            _ => Err(L1InfoTxError::InvalidSelector),
        }
    }

    /// Encodes the [L1BlockInfoTx] object into Ethereum transaction calldata.
    pub fn encode_calldata(&self) -> Bytes {
        match self {
            Self::Bedrock(bedrock_tx) => bedrock_tx.encode_calldata(),
            Self::Ecotone(ecotone_tx) => ecotone_tx.encode_calldata(),
        }
    }

    /// Returns the justification carried by the info transaction, if any.
    pub const fn justification(&self) -> Option<&Justification> {
        match self {
            Self::Bedrock(L1BlockInfoBedrock { justification, .. }) => justification.as_ref(),
            Self::Ecotone(L1BlockInfoEcotone { justification, .. }) => justification.as_ref(),
        }
    }

    /// Returns the L1 block ID for the info transaction.
    pub const fn id(&self) -> crate::types::BlockID {
        match self {
            Self::Ecotone(L1BlockInfoEcotone { number, block_hash, .. }) => {
                crate::types::BlockID { number: *number, hash: *block_hash }
            }
            Self::Bedrock(L1BlockInfoBedrock { number, block_hash, .. }) => {
                crate::types::BlockID { number: *number, hash: *block_hash }
            }
        }
    }

    /// Returns the sequence number for the info transaction.
    pub const fn sequence_number(&self) -> u64 {
        match self {
            Self::Bedrock(L1BlockInfoBedrock { sequence_number, .. }) => *sequence_number,
            Self::Ecotone(L1BlockInfoEcotone { sequence_number, .. }) => *sequence_number,
        }
    }
}

fn read_u64_word(r: &[u8], offset: usize) -> Result<u64, L1InfoTxError> {
    let word = r.get(offset..offset + 32).ok_or(L1InfoTxError::InvalidLength)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(L1InfoTxError::InvalidLength);
    }
    Ok(u64::from_be_bytes(word[24..32].try_into().map_err(|_| L1InfoTxError::InvalidLength)?))
}

impl L1BlockInfoBedrock {
    /// Encodes the [L1BlockInfoBedrock] object into Ethereum transaction calldata.
    pub fn encode_calldata(&self) -> Bytes {
        let mut rlp = Vec::new();
        encode_justification(self.justification.as_ref(), &mut rlp);

        let mut buf = Vec::with_capacity(L1_INFO_TX_STATIC_LEN_BEDROCK + 32 + rlp.len());
        buf.extend_from_slice(L1_INFO_TX_SELECTOR_BEDROCK.as_ref());
        // The single struct argument is a dynamic tuple, encoded as the offset of its payload.
        buf.extend_from_slice(U256::from(32).to_be_bytes::<32>().as_slice());
        buf.extend_from_slice(U256::from(self.number).to_be_bytes::<32>().as_slice());
        buf.extend_from_slice(U256::from(self.time).to_be_bytes::<32>().as_slice());
        buf.extend_from_slice(U256::from(self.base_fee).to_be_bytes::<32>().as_slice());
        buf.extend_from_slice(self.block_hash.as_slice());
        buf.extend_from_slice(U256::from(self.sequence_number).to_be_bytes::<32>().as_slice());
        buf.extend_from_slice(self.batcher_address.into_word().as_slice());
        buf.extend_from_slice(self.l1_fee_overhead.to_be_bytes::<32>().as_slice());
        buf.extend_from_slice(self.l1_fee_scalar.to_be_bytes::<32>().as_slice());
        buf.extend_from_slice(U256::from(self.espresso as u64).to_be_bytes::<32>().as_slice());
        buf.extend_from_slice(
            U256::from(self.espresso_l1_conf_depth).to_be_bytes::<32>().as_slice(),
        );
        // The justification is RLP-encoded and then ABI-encoded as `bytes`: its offset within
        // the struct payload, followed by its length and zero-padded contents.
        buf.extend_from_slice(
            U256::from(L1_INFO_JUSTIFICATION_OFFSET_BEDROCK).to_be_bytes::<32>().as_slice(),
        );
        buf.extend_from_slice(U256::from(rlp.len()).to_be_bytes::<32>().as_slice());
        buf.extend_from_slice(&rlp);
        let padded_len = buf.len() + rlp.len().next_multiple_of(32) - rlp.len();
        buf.resize(padded_len, 0);
        buf.into()
    }

    /// Decodes the [L1BlockInfoBedrock] object from ethereum transaction calldata.
    pub fn decode_calldata(r: &[u8]) -> Result<Self, L1InfoTxError> {
        if r.len() < L1_INFO_TX_STATIC_LEN_BEDROCK + 32 {
            return Err(L1InfoTxError::InvalidLength);
        }

        let fields_offset = read_u64_word(r, 4)?;
        if fields_offset != 32 {
            return Err(L1InfoTxError::InvalidFieldsOffset(fields_offset));
        }
        let number = read_u64_word(r, 36)?;
        let time = read_u64_word(r, 68)?;
        let base_fee = read_u64_word(r, 100)?;
        let block_hash = B256::from_slice(&r[132..164]);
        let sequence_number = read_u64_word(r, 164)?;
        let batcher_address = Address::from_slice(&r[208..228]);
        let l1_fee_overhead = U256::from_be_slice(&r[228..260]);
        let l1_fee_scalar = U256::from_be_slice(&r[260..292]);
        let espresso = read_u64_word(r, 292)? != 0;
        let espresso_l1_conf_depth = read_u64_word(r, 324)?;

        let justification_offset = read_u64_word(r, 356)?;
        if justification_offset != L1_INFO_JUSTIFICATION_OFFSET_BEDROCK {
            return Err(L1InfoTxError::InvalidJustificationOffset(justification_offset));
        }
        let rlp_len = read_u64_word(r, 388)? as usize;
        let rlp_end = 420 + rlp_len;
        let rlp_bytes = r.get(420..rlp_end).ok_or(L1InfoTxError::InvalidLength)?;
        let padded_end = 420 + rlp_len.next_multiple_of(32);
        let padding = r.get(rlp_end..padded_end).ok_or(L1InfoTxError::InvalidLength)?;
        if padding.iter().any(|b| *b != 0) {
            return Err(L1InfoTxError::NonZeroPadding);
        }
        if r.len() != padded_end {
            return Err(L1InfoTxError::TrailingData);
        }
        let justification = decode_justification(rlp_bytes)?;

        Ok(Self {
            number,
            time,
            base_fee,
            block_hash,
            sequence_number,
            batcher_address,
            l1_fee_overhead,
            l1_fee_scalar,
            espresso,
            espresso_l1_conf_depth,
            justification,
        })
    }
}

impl L1BlockInfoEcotone {
    /// Encodes the [L1BlockInfoEcotone] object into Ethereum transaction calldata.
    pub fn encode_calldata(&self) -> Bytes {
        let mut buf = Vec::with_capacity(L1_INFO_TX_STATIC_LEN_ECOTONE + 1);
        buf.extend_from_slice(L1_INFO_TX_SELECTOR_ECOTONE.as_ref());
        buf.extend_from_slice(self.base_fee_scalar.to_be_bytes().as_ref());
        buf.extend_from_slice(self.blob_base_fee_scalar.to_be_bytes().as_ref());
        buf.extend_from_slice(self.sequence_number.to_be_bytes().as_ref());
        buf.extend_from_slice(self.time.to_be_bytes().as_ref());
        buf.extend_from_slice(self.number.to_be_bytes().as_ref());
        buf.extend_from_slice(U256::from(self.base_fee).to_be_bytes::<32>().as_ref());
        buf.extend_from_slice(U256::from(self.blob_base_fee).to_be_bytes::<32>().as_ref());
        buf.extend_from_slice(self.block_hash.as_slice());
        // ABI encoding left-pads the address with zeroes to 32 bytes, matching the
        // "batcherHash" SystemConfig format and version 0 byte.
        buf.extend_from_slice(self.batcher_address.into_word().as_slice());
        buf.extend_from_slice(self.espresso_l1_conf_depth.to_be_bytes().as_ref());
        buf.extend_from_slice((self.espresso as u64).to_be_bytes().as_ref());
        let mut rlp = Vec::new();
        encode_justification(self.justification.as_ref(), &mut rlp);
        buf.extend_from_slice(&rlp);
        buf.into()
    }

    /// Decodes the [L1BlockInfoEcotone] object from ethereum transaction calldata.
    pub fn decode_calldata(r: &[u8]) -> Result<Self, L1InfoTxError> {
        if r.len() < L1_INFO_TX_STATIC_LEN_ECOTONE + 1 {
            return Err(L1InfoTxError::InvalidLength);
        }

        let base_fee_scalar =
            u32::from_be_bytes(r[4..8].try_into().map_err(|_| L1InfoTxError::InvalidLength)?);
        let blob_base_fee_scalar =
            u32::from_be_bytes(r[8..12].try_into().map_err(|_| L1InfoTxError::InvalidLength)?);
        let sequence_number =
            u64::from_be_bytes(r[12..20].try_into().map_err(|_| L1InfoTxError::InvalidLength)?);
        let time =
            u64::from_be_bytes(r[20..28].try_into().map_err(|_| L1InfoTxError::InvalidLength)?);
        let number =
            u64::from_be_bytes(r[28..36].try_into().map_err(|_| L1InfoTxError::InvalidLength)?);
        let base_fee =
            u64::from_be_bytes(r[60..68].try_into().map_err(|_| L1InfoTxError::InvalidLength)?);
        let blob_base_fee =
            u128::from_be_bytes(r[84..100].try_into().map_err(|_| L1InfoTxError::InvalidLength)?);
        let block_hash = B256::from_slice(&r[100..132]);
        let batcher_address = Address::from_slice(&r[144..164]);
        let espresso_l1_conf_depth =
            u64::from_be_bytes(r[164..172].try_into().map_err(|_| L1InfoTxError::InvalidLength)?);
        let espresso =
            u64::from_be_bytes(r[172..180].try_into().map_err(|_| L1InfoTxError::InvalidLength)?)
                != 0;
        let justification = decode_justification(&r[180..])?;

        Ok(Self {
            number,
            time,
            base_fee,
            block_hash,
            sequence_number,
            batcher_address,
            blob_base_fee,
            blob_base_fee_scalar,
            base_fee_scalar,
            espresso,
            espresso_l1_conf_depth,
            justification,
        })
    }
}
