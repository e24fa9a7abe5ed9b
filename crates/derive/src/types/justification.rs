//! The justification attached to each L2 batch in Espresso mode: the window
//! of Espresso block headers the batch claims to summarize, with namespace
//! proofs for the transactions it includes.

use alloc::vec::Vec;
use alloy_rlp::{Decodable, Encodable, EMPTY_LIST_CODE, EMPTY_STRING_CODE};
use op_espresso_types::{Commitment, Header, NmtProof};

/// One Espresso block inside the sequencing window, together with the proof
/// that the batch includes exactly its namespace transactions. The proof is
/// stripped when the batch is forced empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockJustification {
    /// The Espresso block header.
    pub header: Header,
    /// The namespace inclusion proof against `header.transactions_root`.
    pub proof: Option<NmtProof>,
}

impl Encodable for BlockJustification {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        let payload_length = self.rlp_payload_length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.header.encode(out);
        match &self.proof {
            Some(proof) => proof.encode(out),
            None => out.put_u8(EMPTY_STRING_CODE),
        }
    }
    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl BlockJustification {
    fn rlp_payload_length(&self) -> usize {
        self.header.length() + self.proof.as_ref().map_or(1, Encodable::length)
    }
}

impl Decodable for BlockJustification {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut body = alloy_rlp::Header::decode_bytes(buf, true)?;
        let header = Header::decode(&mut body)?;
        let proof = match NmtProof::decode(&mut body)? {
            proof if proof.is_empty() => None,
            proof => Some(proof),
        };
        Ok(Self { header, proof })
    }
}

/// The evidence attached to an L2 batch that the Espresso Sequencer endorsed
/// exactly the included transactions over exactly the claimed time window.
///
/// `prev` and `next` bookend the window: `prev` is the last Espresso block
/// strictly before the window start (absent only when the Espresso genesis
/// falls in or after the window), and `next` is the first block at or after
/// the window end. `blocks` holds every block whose timestamp lies within
/// the window, in height order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Justification {
    /// The last Espresso block before the start of the window.
    pub prev: Option<Header>,
    /// The Espresso blocks inside the window.
    pub blocks: Vec<BlockJustification>,
    /// The first Espresso block after the end of the window.
    pub next: Header,
}

impl Justification {
    /// Returns the earliest header supplied by the justification.
    pub fn first(&self) -> &Header {
        self.prev
            .as_ref()
            .or_else(|| self.blocks.first().map(|block| &block.header))
            .unwrap_or(&self.next)
    }

    /// Returns the height of the earliest supplied header: the position in
    /// the on-L1 commitment chain where verification of this justification
    /// begins.
    pub fn first_height(&self) -> u64 {
        self.first().height
    }

    /// Returns the commitments to every supplied header, in chain order.
    pub fn commitments(&self) -> Vec<Commitment> {
        let mut commitments = Vec::with_capacity(self.blocks.len() + 2);
        if let Some(prev) = &self.prev {
            commitments.push(prev.commit());
        }
        commitments.extend(self.blocks.iter().map(|block| block.header.commit()));
        commitments.push(self.next.commit());
        commitments
    }
}

impl Encodable for Justification {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        let payload_length = self.rlp_payload_length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        match &self.prev {
            Some(prev) => prev.encode(out),
            None => out.put_u8(EMPTY_LIST_CODE),
        }
        self.blocks.encode(out);
        self.next.encode(out);
    }
    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Justification {
    fn rlp_payload_length(&self) -> usize {
        self.prev.as_ref().map_or(1, Encodable::length)
            + self.blocks.length()
            + self.next.length()
    }
}

impl Decodable for Justification {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut body = alloy_rlp::Header::decode_bytes(buf, true)?;
        let prev = if body.first() == Some(&EMPTY_LIST_CODE) {
            body = &body[1..];
            None
        } else {
            Some(Header::decode(&mut body)?)
        };
        let blocks = Vec::<BlockJustification>::decode(&mut body)?;
        let next = Header::decode(&mut body)?;
        Ok(Self { prev, blocks, next })
    }
}

/// Encodes an optional [Justification] for embedding in the L1-info deposit
/// transaction. An absent justification is the single byte `0xC0` (the empty
/// RLP list).
pub fn encode_justification(justification: Option<&Justification>, out: &mut Vec<u8>) {
    match justification {
        Some(justification) => justification.encode(out),
        None => out.push(EMPTY_LIST_CODE),
    }
}

/// Decodes an optional [Justification] from the tail of the L1-info deposit
/// calldata. The `0xC0` absent case is checked before structural decoding.
pub fn decode_justification(data: &[u8]) -> alloy_rlp::Result<Option<Justification>> {
    if data == [EMPTY_LIST_CODE] {
        return Ok(None);
    }
    let mut buf = data;
    let justification = Justification::decode(&mut buf)?;
    if !buf.is_empty() {
        return Err(alloy_rlp::Error::UnexpectedLength);
    }
    Ok(Some(justification))
}
