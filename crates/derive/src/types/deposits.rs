//! Contains the deposit transaction type and its source-hash derivation.

use super::{RawTransaction, DEPOSIT_TX_TYPE};
use alloc::vec::Vec;
use alloy_primitives::{keccak256, Address, Bytes, TxKind, B256, U256};
use alloy_rlp::{Decodable, Encodable, EMPTY_STRING_CODE};

/// The source-domain identifier for L1-info deposits. Source hashes are
/// domain-separated so L1-info deposits can never collide with user deposits
/// or upgrade transactions.
const L1_INFO_SOURCE_DOMAIN: u64 = 1;

/// The source of an L1-info deposit transaction: the L1 block it attests to
/// and the L2 sequence number within that epoch. Uniquely identifies the
/// deposit on L2.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct L1InfoDepositSource {
    /// The L1 block hash.
    pub l1_block_hash: B256,
    /// The sequence number.
    pub seq_number: u64,
}

impl L1InfoDepositSource {
    /// Creates a new [L1InfoDepositSource].
    pub const fn new(l1_block_hash: B256, seq_number: u64) -> Self {
        Self { l1_block_hash, seq_number }
    }

    /// Returns the source hash.
    pub fn source_hash(&self) -> B256 {
        let mut input = [0u8; 32 * 2];
        input[..32].copy_from_slice(&self.l1_block_hash[..]);
        input[32 * 2 - 8..].copy_from_slice(&self.seq_number.to_be_bytes());
        let deposit_id_hash = keccak256(input);
        let mut domain_input = [0u8; 32 * 2];
        domain_input[32 - 8..32].copy_from_slice(&L1_INFO_SOURCE_DOMAIN.to_be_bytes());
        domain_input[32..].copy_from_slice(&deposit_id_hash[..]);
        keccak256(domain_input)
    }
}

/// Deposit transactions, also known as deposits, are initiated on L1 and
/// executed on L2. The L1-info deposit at the top of every L2 block is the
/// carrier of the batch justification in Espresso mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxDeposit {
    /// Hash that uniquely identifies the source of the deposit.
    pub source_hash: B256,
    /// The address of the sender account.
    pub from: Address,
    /// The address of the recipient account, or create if the deposited
    /// transaction is a contract creation.
    pub to: TxKind,
    /// The ETH value to mint on L2.
    pub mint: Option<u128>,
    /// The ETH value to send to the recipient account.
    pub value: U256,
    /// The gas limit for the L2 transaction.
    pub gas_limit: u64,
    /// Field indicating if this transaction is exempt from the L2 gas limit.
    pub is_system_transaction: bool,
    /// The calldata of the transaction.
    pub input: Bytes,
}

impl TxDeposit {
    fn rlp_payload_length(&self) -> usize {
        self.source_hash.length()
            + self.from.length()
            + match self.to {
                TxKind::Call(to) => to.length(),
                TxKind::Create => 1,
            }
            + self.mint.map_or(1, |mint| mint.length())
            + self.value.length()
            + self.gas_limit.length()
            + self.is_system_transaction.length()
            + self.input.length()
    }

    /// Returns the EIP-2718 typed encoding of the deposit: the deposit type
    /// byte followed by the RLP fields, ready for inclusion in a payload's
    /// transaction list.
    pub fn encoded(&self) -> RawTransaction {
        let mut buf = Vec::with_capacity(1 + self.length());
        buf.push(DEPOSIT_TX_TYPE);
        self.encode(&mut buf);
        RawTransaction(buf.into())
    }
}

impl Encodable for TxDeposit {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        let payload_length = self.rlp_payload_length();
        alloy_rlp::Header { list: true, payload_length }.encode(out);
        self.source_hash.encode(out);
        self.from.encode(out);
        match self.to {
            TxKind::Call(to) => to.encode(out),
            TxKind::Create => out.put_u8(EMPTY_STRING_CODE),
        }
        match self.mint {
            Some(mint) => mint.encode(out),
            None => out.put_u8(EMPTY_STRING_CODE),
        }
        self.value.encode(out);
        self.gas_limit.encode(out);
        self.is_system_transaction.encode(out);
        self.input.encode(out);
    }
    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

impl Decodable for TxDeposit {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut body = alloy_rlp::Header::decode_bytes(buf, true)?;
        let source_hash = B256::decode(&mut body)?;
        let from = Address::decode(&mut body)?;
        let to = if body.first() == Some(&EMPTY_STRING_CODE) {
            body = &body[1..];
            TxKind::Create
        } else {
            TxKind::Call(Address::decode(&mut body)?)
        };
        let mint = if body.first() == Some(&EMPTY_STRING_CODE) {
            body = &body[1..];
            None
        } else {
            Some(u128::decode(&mut body)?)
        };
        Ok(Self {
            source_hash,
            from,
            to,
            mint,
            value: U256::decode(&mut body)?,
            gas_limit: u64::decode(&mut body)?,
            is_system_transaction: bool::decode(&mut body)?,
            input: Bytes::decode(&mut body)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloy_primitives::{address, b256, hex};

    #[test]
    fn test_l1_info_source_hash() {
        let source = L1InfoDepositSource::new(B256::ZERO, 0);
        assert_eq!(
            source.source_hash().to_string(),
            "0x009316a6b27b778fc9c4cd520e332fce845aa0089877f87cfe8c1d77fa4cc110"
        );
        let source = L1InfoDepositSource::new(
            b256!("392012032675be9f94aae5ab442de73c5f4fb1bf30fa7dd0d2442239899a40fc"),
            4,
        );
        assert_eq!(
            source.source_hash().to_string(),
            "0x9faba4bffba01d831cb39e31f4f635c94687f9388ae6e3995cb3c788ce36ce04"
        );
        // The sequence number separates deposits within one epoch.
        let other = L1InfoDepositSource { seq_number: 5, ..source.clone() };
        assert_ne!(source.source_hash(), other.source_hash());
    }

    #[test]
    fn test_tx_deposit_rlp_roundtrip() {
        let cases = [
            TxDeposit {
                source_hash: B256::with_last_byte(1),
                from: address!("deaddeaddeaddeaddeaddeaddeaddeaddead0001"),
                to: TxKind::Call(address!("4200000000000000000000000000000000000015")),
                mint: None,
                value: U256::ZERO,
                gas_limit: 150_000_000,
                is_system_transaction: true,
                input: hex!("440a5e20").into(),
            },
            TxDeposit {
                source_hash: B256::with_last_byte(2),
                from: address!("1111111111111111111111111111111111111111"),
                to: TxKind::Create,
                mint: Some(10),
                value: U256::from(100),
                gas_limit: 1000,
                is_system_transaction: false,
                input: Bytes::new(),
            },
        ];
        for tx in cases {
            let mut buf = Vec::new();
            tx.encode(&mut buf);
            assert_eq!(buf.len(), tx.length());
            let decoded = TxDeposit::decode(&mut buf.as_slice()).unwrap();
            assert_eq!(decoded, tx);
        }
    }

    #[test]
    fn test_encoded_is_deposit_typed() {
        let tx = TxDeposit {
            source_hash: B256::with_last_byte(1),
            from: address!("deaddeaddeaddeaddeaddeaddeaddeaddead0001"),
            to: TxKind::Call(address!("4200000000000000000000000000000000000015")),
            mint: None,
            value: U256::ZERO,
            gas_limit: 1_000_000,
            is_system_transaction: false,
            input: Bytes::new(),
        };
        let raw = tx.encoded();
        assert_eq!(raw.as_ref()[0], DEPOSIT_TX_TYPE);
        assert!(raw.is_deposit());
    }
}
