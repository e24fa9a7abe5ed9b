//! Contains the [BatchValidity] type and its helpers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Batch Validity
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchValidity {
    /// The batch is invalid now and in the future, unless we reorg
    Drop,
    /// The batch is valid and should be processed
    Accept,
    /// We are lacking L1 information until we can proceed batch filtering
    Undecided,
    /// The batch may be valid, but cannot be processed yet and should be checked again later
    Future,
}

impl BatchValidity {
    /// Returns if the batch is dropped.
    pub const fn is_drop(&self) -> bool {
        matches!(self, Self::Drop)
    }

    /// Returns if the batch is accepted.
    pub const fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }

    /// Returns if the batch is undecided.
    pub const fn is_undecided(&self) -> bool {
        matches!(self, Self::Undecided)
    }

    /// Returns if the batch is future.
    pub const fn is_future(&self) -> bool {
        matches!(self, Self::Future)
    }
}
