//! Bookend checks for Espresso sequencing windows.
//!
//! A justification proves window membership with a pair of headers around
//! each endpoint of the window: the last block strictly before the endpoint
//! and the first block at or after it. Because the commitment chain is
//! checked separately for contiguity, correct bookends imply that no block
//! belonging to the window was omitted.

use crate::types::Justification;
use op_espresso_types::Header;

/// An endpoint of the sequencing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEndpoint {
    /// The inclusive start of the window.
    Start,
    /// The exclusive end of the window.
    End,
}

impl core::fmt::Display for WindowEndpoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Start => write!(f, "WindowStart"),
            Self::End => write!(f, "WindowEnd"),
        }
    }
}

impl WindowEndpoint {
    /// Extracts the pair of headers surrounding this endpoint from a
    /// justification: the last block before the endpoint (if one exists) and
    /// the first block at or after it.
    pub fn bookends<'a>(&self, jst: &'a Justification) -> (Option<&'a Header>, &'a Header) {
        match self {
            Self::Start => {
                // The bookend just before the start of the window is always `prev`. If it
                // doesn't exist, it's because the genesis falls in or after the window.
                let prev = jst.prev.as_ref();
                // If the window is not empty, the first block in the window defines the start
                // of the window. Otherwise, the place where its starting point would be is
                // defined by the first block after the end of the window.
                let next = jst.blocks.first().map_or(&jst.next, |block| &block.header);
                (prev, next)
            }
            Self::End => {
                // If the window is not empty, the last block defines its end. Otherwise, the
                // first block before where the window would be defines the end of the window.
                // If it doesn't exist, it's because the genesis falls after the window.
                let prev =
                    jst.blocks.last().map(|block| &block.header).or(jst.prev.as_ref());
                // The end of the window is always defined by the first block after the range.
                (prev, &jst.next)
            }
        }
    }
}

/// Checks that the bookend blocks of an Espresso block range surround the
/// given starting or ending timestamp.
pub fn check_bookends(endpoint: WindowEndpoint, timestamp: u64, jst: &Justification) -> bool {
    let (prev, next) = endpoint.bookends(jst);
    match prev {
        None => {
            // It is allowed that there is no Espresso block just before the endpoint only in
            // the case where the Espresso genesis block falls at or after the endpoint.
            let first = jst.first();
            if first.height != 0 {
                warn!(
                    target: "batch-validator",
                    "dropping batch: prev header is missing at {endpoint}, but first block {} is not genesis",
                    first.height
                );
                return false;
            }
            if first.timestamp < timestamp {
                warn!(
                    target: "batch-validator",
                    "dropping batch: prev header is missing at {endpoint}, but genesis block is before the endpoint"
                );
                return false;
            }
        }
        Some(prev) => {
            if prev.timestamp >= timestamp {
                warn!(
                    target: "batch-validator",
                    "dropping batch: prev header at {endpoint} has timestamp {} >= {timestamp}",
                    prev.timestamp
                );
                return false;
            }
        }
    }
    if next.timestamp < timestamp {
        warn!(
            target: "batch-validator",
            "dropping batch: next header at {endpoint} has timestamp {} < {timestamp}",
            next.timestamp
        );
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockJustification;
    use alloc::{vec, vec::Vec};
    use op_espresso_types::Header;

    fn header(height: u64, timestamp: u64) -> Header {
        Header { height, timestamp, ..Default::default() }
    }

    fn window(prev: Option<Header>, blocks: Vec<Header>, next: Header) -> Justification {
        Justification {
            prev,
            blocks: blocks
                .into_iter()
                .map(|header| BlockJustification { header, proof: None })
                .collect(),
            next,
        }
    }

    #[test]
    fn test_bookends_non_empty_window() {
        let jst = window(Some(header(0, 9)), vec![header(1, 10), header(2, 11)], header(3, 12));

        let (prev, next) = WindowEndpoint::Start.bookends(&jst);
        assert_eq!(prev.unwrap().height, 0);
        assert_eq!(next.height, 1);

        let (prev, next) = WindowEndpoint::End.bookends(&jst);
        assert_eq!(prev.unwrap().height, 2);
        assert_eq!(next.height, 3);

        assert!(check_bookends(WindowEndpoint::Start, 10, &jst));
        assert!(check_bookends(WindowEndpoint::End, 12, &jst));
    }

    #[test]
    fn test_bookends_empty_window() {
        let jst = window(Some(header(0, 9)), vec![], header(1, 30));

        let (prev, next) = WindowEndpoint::Start.bookends(&jst);
        assert_eq!(prev.unwrap().height, 0);
        assert_eq!(next.height, 1);

        let (prev, next) = WindowEndpoint::End.bookends(&jst);
        assert_eq!(prev.unwrap().height, 0);
        assert_eq!(next.height, 1);

        assert!(check_bookends(WindowEndpoint::Start, 10, &jst));
        assert!(check_bookends(WindowEndpoint::End, 12, &jst));
    }

    #[test]
    fn test_prev_after_endpoint_rejected() {
        let jst = window(Some(header(0, 10)), vec![header(1, 10)], header(2, 12));
        // prev must be strictly before the window start.
        assert!(!check_bookends(WindowEndpoint::Start, 10, &jst));
    }

    #[test]
    fn test_next_before_endpoint_rejected() {
        let jst = window(Some(header(0, 9)), vec![header(1, 10)], header(2, 11));
        assert!(!check_bookends(WindowEndpoint::End, 12, &jst));
    }

    #[test]
    fn test_genesis_window_allows_missing_prev() {
        let jst = window(None, vec![header(0, 10)], header(1, 12));
        assert!(check_bookends(WindowEndpoint::Start, 10, &jst));
        assert!(check_bookends(WindowEndpoint::End, 12, &jst));
    }

    #[test]
    fn test_missing_prev_requires_genesis() {
        let jst = window(None, vec![header(1, 10)], header(2, 12));
        assert!(!check_bookends(WindowEndpoint::Start, 10, &jst));
    }

    #[test]
    fn test_missing_prev_genesis_before_endpoint_rejected() {
        let jst = window(None, vec![header(0, 9)], header(1, 12));
        assert!(!check_bookends(WindowEndpoint::Start, 10, &jst));
    }
}
