//! L1 provider traits for the Espresso derivation core.

use crate::{errors::PipelineResult, types::BlockInfo};
use alloc::boxed::Box;
use async_trait::async_trait;
use op_espresso_types::Commitment;

/// Describes the L1 capabilities the Espresso batch checks require: block
/// lookups by number, and access to the sequence of Espresso header
/// commitments authenticated on L1 by the commitment contract.
#[async_trait]
pub trait EspressoL1Provider {
    /// Returns the L1 block with the given number, or an error if the block
    /// does not exist in the data source.
    async fn l1_block_ref_by_number(&mut self, number: u64) -> PipelineResult<BlockInfo>;

    /// Compares `commitments` against the authenticated commitments recorded
    /// on L1, starting at Espresso block height `first_height`. Returns
    /// `Ok(false)` on a mismatch, and an error if the authenticated list
    /// cannot be read (e.g. it has not caught up to `first_height` yet).
    async fn verify_commitments(
        &mut self,
        first_height: u64,
        commitments: &[Commitment],
    ) -> PipelineResult<bool>;
}
