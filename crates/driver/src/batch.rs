//! The in-progress Espresso batch accumulated by the sequencing driver.

use op_espresso_derive::types::{BlockJustification, L2BlockInfo};
use op_espresso_types::{Bytes, Header};

/// The state of one Espresso batch being built: the window bounds, the
/// justification accumulated so far, and the per-block transaction payloads
/// fetched from the query service.
///
/// The batch is owned exclusively by the driver. It is destroyed either when
/// sealed into an engine payload, or when an L2 reorg invalidates `onto`.
#[derive(Debug, Clone, Default)]
pub struct InProgressBatch {
    /// The L2 head this batch builds on.
    pub onto: L2BlockInfo,
    /// The inclusive start of the sequencing window.
    pub window_start: u64,
    /// The exclusive end of the sequencing window.
    pub window_end: u64,
    /// The last Espresso block before the window, if the Espresso genesis
    /// does not fall in or after the window.
    pub prev: Option<Header>,
    /// The height of the first Espresso block in the window.
    pub first_height: u64,
    /// The in-window blocks accumulated so far, with their namespace proofs.
    pub blocks: Vec<BlockJustification>,
    /// The namespace transactions of each accumulated block, in block order.
    pub transactions: Vec<Vec<Bytes>>,
    /// The first Espresso block at or past the window end, once the external
    /// sequencer has produced it.
    pub next: Option<Header>,
}

impl InProgressBatch {
    /// Creates a new in-progress batch for the window starting at the child
    /// of `onto`.
    pub fn new(
        onto: L2BlockInfo,
        window_start: u64,
        window_end: u64,
        prev: Option<Header>,
    ) -> Self {
        // The first height of the window follows the leading bookend; a
        // missing bookend means the window begins at the Espresso genesis.
        let first_height = prev.as_ref().map_or(0, |prev| prev.height + 1);
        Self {
            onto,
            window_start,
            window_end,
            prev,
            first_height,
            blocks: Vec::new(),
            transactions: Vec::new(),
            next: None,
        }
    }

    /// The batch is complete once the trailing bookend is known: every block
    /// of the window has then been observed.
    pub fn complete(&self) -> bool {
        self.next.is_some()
    }

    /// The height of the next in-window block to fetch.
    pub fn next_height(&self) -> u64 {
        self.first_height + self.blocks.len() as u64
    }
}
