//! Espresso Sequencer block types.
//!
//! The JSON encodings of these types match the Espresso query-service APIs:
//! byte strings are arrays of integers (not base64), and `U256` values are
//! `0x`-prefixed hex strings. The RLP encodings are used when a batch
//! justification is embedded in the L1-info deposit transaction.

use crate::commit::{Commitment, RawCommitmentBuilder};
use alloc::vec::Vec;
use alloy_primitives::{B256, U256};
use alloy_rlp::{Decodable, Encodable, EMPTY_LIST_CODE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A byte string which serializes to JSON as an array of integers, rather
/// than a base64 string, for compatibility with the Espresso APIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

/// An opaque namespaced-Merkle-tree inclusion proof, as returned by the
/// Espresso query service. The node carries these without interpreting them.
pub type NmtProof = Bytes;

impl Bytes {
    /// Returns true if the byte string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the length of the byte string.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ints = Vec::<u64>::deserialize(deserializer)?;
        let mut bytes = Vec::with_capacity(ints.len());
        for int in ints {
            let byte = u8::try_from(int)
                .map_err(|_| serde::de::Error::custom("byte out of range"))?;
            bytes.push(byte);
        }
        Ok(Self(bytes))
    }
}

impl Encodable for Bytes {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.0.as_slice().encode(out);
    }
    fn length(&self) -> usize {
        self.0.as_slice().length()
    }
}

impl Decodable for Bytes {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let bytes = alloy_rlp::Header::decode_bytes(buf, false)?;
        Ok(Self(bytes.to_vec()))
    }
}

/// The root of the namespaced Merkle tree over all transactions in an
/// Espresso block, keyed by per-rollup namespace id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NmtRoot {
    /// The raw root bytes. Variable length: the tree parameters are fixed by
    /// the deployment, not by this type.
    pub root: Bytes,
}

impl NmtRoot {
    /// Computes the commitment to the root.
    pub fn commit(&self) -> Commitment {
        RawCommitmentBuilder::new("NMTROOT")
            .var_size_field("root", self.root.as_ref())
            .finalize()
    }
}

impl Encodable for NmtRoot {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        let payload_length = self.root.length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.root.encode(out);
    }
    fn length(&self) -> usize {
        let payload_length = self.root.length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for NmtRoot {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut body = alloy_rlp::Header::decode_bytes(buf, true)?;
        let root = Bytes::decode(&mut body)?;
        Ok(Self { root })
    }
}

/// A fully qualified reference to an L1 block, as recorded by the Espresso
/// Sequencer once the block is finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1BlockInfo {
    /// The L1 block number.
    pub number: u64,
    /// The L1 block timestamp.
    pub timestamp: U256,
    /// The L1 block hash.
    pub hash: B256,
}

impl L1BlockInfo {
    /// Computes the commitment to the L1 block reference.
    pub fn commit(&self) -> Commitment {
        RawCommitmentBuilder::new("L1BLOCK")
            .u64_field("number", self.number)
            .u256_field("timestamp", &self.timestamp)
            .fixed_size_field("hash", self.hash.as_slice())
            .finalize()
    }
}

impl Encodable for L1BlockInfo {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        let payload_length =
            self.number.length() + self.timestamp.length() + self.hash.length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.number.encode(out);
        self.timestamp.encode(out);
        self.hash.encode(out);
    }
    fn length(&self) -> usize {
        let payload_length =
            self.number.length() + self.timestamp.length() + self.hash.length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for L1BlockInfo {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut body = alloy_rlp::Header::decode_bytes(buf, true)?;
        Ok(Self {
            number: u64::decode(&mut body)?,
            timestamp: U256::decode(&mut body)?,
            hash: B256::decode(&mut body)?,
        })
    }
}

/// An Espresso Sequencer block header.
///
/// Timestamps are not guaranteed to be strictly monotone across consecutive
/// headers; consumers must tolerate equal or occasionally decreasing values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// The block height. Monotonic, starting at 0 for the Espresso genesis.
    pub height: u64,
    /// The block timestamp, in seconds.
    pub timestamp: u64,
    /// The latest L1 block number the sequencer had seen when producing this
    /// block.
    pub l1_head: u64,
    /// The latest *finalized* L1 block, if any.
    #[serde(default)]
    pub l1_finalized: Option<L1BlockInfo>,
    /// The root of the namespaced Merkle tree over this block's transactions.
    pub transactions_root: NmtRoot,
}

impl Header {
    /// Computes the commitment to the header.
    ///
    /// The height is intentionally not part of the commitment: a header's
    /// position is bound by its index in the on-L1 commitment chain.
    pub fn commit(&self) -> Commitment {
        RawCommitmentBuilder::new("BLOCK")
            .u64_field("timestamp", self.timestamp)
            .u64_field("l1_head", self.l1_head)
            .optional_field("l1_finalized", self.l1_finalized.as_ref().map(L1BlockInfo::commit))
            .field("transactions_root", self.transactions_root.commit())
            .finalize()
    }
}

impl Encodable for Header {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        let payload_length = self.rlp_payload_length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.height.encode(out);
        self.timestamp.encode(out);
        self.l1_head.encode(out);
        match &self.l1_finalized {
            Some(info) => info.encode(out),
            None => out.put_u8(EMPTY_LIST_CODE),
        }
        self.transactions_root.encode(out);
    }
    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Header {
    fn rlp_payload_length(&self) -> usize {
        self.height.length()
            + self.timestamp.length()
            + self.l1_head.length()
            + self.l1_finalized.as_ref().map_or(1, Encodable::length)
            + self.transactions_root.length()
    }
}

impl Decodable for Header {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut body = alloy_rlp::Header::decode_bytes(buf, true)?;
        let height = u64::decode(&mut body)?;
        let timestamp = u64::decode(&mut body)?;
        let l1_head = u64::decode(&mut body)?;
        let l1_finalized = if body.first() == Some(&EMPTY_LIST_CODE) {
            body = &body[1..];
            None
        } else {
            Some(L1BlockInfo::decode(&mut body)?)
        };
        let transactions_root = NmtRoot::decode(&mut body)?;
        Ok(Self { height, timestamp, l1_head, l1_finalized, transactions_root })
    }
}
