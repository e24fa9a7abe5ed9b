#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations, missing_docs, unreachable_pub, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod traits;
pub use traits::{
    AttributesBuilder, EngineControl, L1OriginSelector, NoopMetrics, SequencerMetrics,
};

pub mod batch;
pub use batch::InProgressBatch;

pub mod sequencer;
pub use sequencer::{Sequencer, SequencerMode};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
