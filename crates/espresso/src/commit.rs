//! The commitment scheme used to bind Espresso Sequencer data to the L1
//! commitment contract.
//!
//! Commitments are domain-separated Keccak-256 hashes built up field by field
//! with [`RawCommitmentBuilder`]. Both sides of the derivation (the sequencer
//! constructing batches and the verifier checking them) must agree on these
//! encodings bit-for-bit, so any change here is consensus-breaking.

use alloy_primitives::{Keccak256, U256};
use core::fmt;

/// A byte sequence which can never appear in a valid UTF-8 string. Appended
/// after every constant string to terminate it and act as a domain separator.
const INVALID_UTF8: [u8; 2] = [0xC0, 0x7F];

/// A 32-byte commitment to a committable Espresso value.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Commitment([u8; 32]);

impl Commitment {
    /// Returns the commitment as a byte slice.
    pub const fn as_slice(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Commitment {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({self})")
    }
}

/// An incremental builder for [`Commitment`]s.
///
/// The builder is deliberately move-style: every method consumes the builder
/// and returns it, so a builder can never be shared between threads or reused
/// after [`RawCommitmentBuilder::finalize`]. Each commitment derivation uses
/// a fresh builder.
pub struct RawCommitmentBuilder {
    hasher: Keccak256,
}

impl fmt::Debug for RawCommitmentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCommitmentBuilder").finish_non_exhaustive()
    }
}

impl RawCommitmentBuilder {
    /// Creates a new builder, seeded with the domain tag `name`.
    pub fn new(name: &'static str) -> Self {
        Self { hasher: Keccak256::new() }.constant_string(name)
    }

    /// Appends a constant string to the running hash.
    ///
    /// The string `s` must be a compile-time constant: its length is not
    /// encoded, so strings whose length varies with the input object lead to
    /// domain collisions. The `&'static str` bound enforces this.
    pub fn constant_string(mut self, s: &'static str) -> Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(INVALID_UTF8);
        self
    }

    /// Appends a named field of another committable type.
    pub fn field(self, name: &'static str, commitment: Commitment) -> Self {
        self.constant_string(name).fixed_size_bytes(commitment.as_slice())
    }

    /// Appends a named optional field: a `0x00` byte when absent, a `0x01`
    /// byte followed by the commitment when present.
    pub fn optional_field(self, name: &'static str, commitment: Option<Commitment>) -> Self {
        let mut builder = self.constant_string(name);
        match commitment {
            Some(commitment) => {
                builder.hasher.update([1u8]);
                builder.fixed_size_bytes(commitment.as_slice())
            }
            None => {
                builder.hasher.update([0u8]);
                builder
            }
        }
    }

    /// Appends a `u64` as 8 little-endian bytes.
    pub fn u64(mut self, n: u64) -> Self {
        self.hasher.update(n.to_le_bytes());
        self
    }

    /// Appends a named `u64` field.
    pub fn u64_field(self, name: &'static str, n: u64) -> Self {
        self.constant_string(name).u64(n)
    }

    /// Appends a `u256` as 32 little-endian bytes.
    pub fn u256(mut self, n: &U256) -> Self {
        self.hasher.update(n.to_le_bytes::<32>());
        self
    }

    /// Appends a named `u256` field.
    pub fn u256_field(self, name: &'static str, n: &U256) -> Self {
        self.constant_string(name).u256(n)
    }

    /// Appends a fixed-size byte array verbatim, without a length prefix.
    ///
    /// The caller must ensure the length of `bytes` is statically determined
    /// by the type being committed to. Byte strings whose length varies with
    /// the input belong in [`RawCommitmentBuilder::var_size_bytes`].
    pub fn fixed_size_bytes(mut self, bytes: &[u8]) -> Self {
        self.hasher.update(bytes);
        self
    }

    /// Appends a named fixed-size byte field.
    pub fn fixed_size_field(self, name: &'static str, bytes: &[u8]) -> Self {
        self.constant_string(name).fixed_size_bytes(bytes)
    }

    /// Appends a dynamically-sized byte string, length-prefixed to prevent
    /// length extension and domain collision attacks.
    pub fn var_size_bytes(mut self, bytes: &[u8]) -> Self {
        self = self.u64(bytes.len() as u64);
        self.hasher.update(bytes);
        self
    }

    /// Appends a named dynamically-sized byte field.
    pub fn var_size_field(self, name: &'static str, bytes: &[u8]) -> Self {
        self.constant_string(name).var_size_bytes(bytes)
    }

    /// Consumes the builder and returns the commitment.
    pub fn finalize(self) -> Commitment {
        Commitment(self.hasher.finalize().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloy_primitives::keccak256;

    #[test]
    fn test_constant_string_appends_separator() {
        let commit = RawCommitmentBuilder::new("TAG").finalize();
        let expected = keccak256([b"TAG".as_slice(), &INVALID_UTF8].concat());
        assert_eq!(commit.as_slice(), &expected.0);
    }

    #[test]
    fn test_var_size_bytes_length_prefixed() {
        // An empty byte string still contributes its 8-byte length.
        let empty = RawCommitmentBuilder::new("TAG").var_size_bytes(&[]).finalize();
        let expected = keccak256(
            [b"TAG".as_slice(), &INVALID_UTF8, &0u64.to_le_bytes()].concat(),
        );
        assert_eq!(empty.as_slice(), &expected.0);

        // Shifting a byte between two var-size fields changes the commitment.
        let a = RawCommitmentBuilder::new("TAG")
            .var_size_bytes(&[1, 2])
            .var_size_bytes(&[3])
            .finalize();
        let b = RawCommitmentBuilder::new("TAG")
            .var_size_bytes(&[1])
            .var_size_bytes(&[2, 3])
            .finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn test_optional_field_tagging() {
        let absent = RawCommitmentBuilder::new("TAG").optional_field("f", None).finalize();
        let present = RawCommitmentBuilder::new("TAG")
            .optional_field("f", Some(Commitment::default()))
            .finalize();
        assert_ne!(absent, present);

        let expected_absent = keccak256(
            [b"TAG".as_slice(), &INVALID_UTF8, b"f", &INVALID_UTF8, &[0u8]].concat(),
        );
        assert_eq!(absent.as_slice(), &expected_absent.0);
    }

    #[test]
    fn test_u256_little_endian() {
        let commit =
            RawCommitmentBuilder::new("TAG").u256(&U256::from(0x0456u64)).finalize();
        let mut le = [0u8; 32];
        le[0] = 0x56;
        le[1] = 0x04;
        let expected = keccak256([b"TAG".as_slice(), &INVALID_UTF8, &le].concat());
        assert_eq!(commit.as_slice(), &expected.0);
    }

    #[test]
    fn test_commitment_display() {
        let commit = Commitment::from([0xAB; 32]);
        assert_eq!(commit.to_string(), "ab".repeat(32));
    }
}
