//! Test utilities for the derivation core.

use crate::{
    errors::{PipelineError, PipelineResult},
    traits::EspressoL1Provider,
    types::BlockInfo,
};
use alloc::{boxed::Box, format, vec::Vec};
use async_trait::async_trait;
use op_espresso_types::{Commitment, Header};

/// A mock [EspressoL1Provider] backed by an in-memory L1 chain and the full
/// sequence of Espresso headers, indexed by height. Commitments are verified
/// by recomputing them from the stored headers, the way the commitment
/// contract records them.
#[derive(Debug, Clone, Default)]
pub struct TestEspressoL1Provider {
    /// The L1 chain.
    pub blocks: Vec<BlockInfo>,
    /// Every Espresso header, indexed by height.
    pub espresso_headers: Vec<Header>,
}

impl TestEspressoL1Provider {
    /// Creates a provider over the given L1 chain.
    pub fn with_blocks(blocks: Vec<BlockInfo>) -> Self {
        Self { blocks, espresso_headers: Vec::new() }
    }

    /// Sets the Espresso headers backing commitment verification.
    pub fn headers(mut self, headers: Vec<Header>) -> Self {
        self.espresso_headers = headers;
        self
    }
}

#[async_trait]
impl EspressoL1Provider for TestEspressoL1Provider {
    async fn l1_block_ref_by_number(&mut self, number: u64) -> PipelineResult<BlockInfo> {
        self.blocks
            .iter()
            .find(|block| block.number == number)
            .copied()
            .ok_or_else(|| {
                PipelineError::Provider(format!("L1 block number {number} not available")).temp()
            })
    }

    async fn verify_commitments(
        &mut self,
        first_height: u64,
        commitments: &[Commitment],
    ) -> PipelineResult<bool> {
        let end = first_height as usize + commitments.len();
        if end > self.espresso_headers.len() {
            return Err(PipelineError::Provider(format!(
                "commitments {first_height}..{end} not yet available"
            ))
            .temp());
        }
        for (i, commitment) in commitments.iter().enumerate() {
            if *commitment != self.espresso_headers[first_height as usize + i].commit() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
