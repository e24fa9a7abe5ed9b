#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations, missing_docs, unreachable_pub, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![no_std]

extern crate alloc;

#[macro_use]
extern crate tracing;

pub mod errors;
pub use errors::{PipelineError, PipelineErrorKind, PipelineResult, ResetError};

pub mod traits;

pub mod types;

pub mod bookend;
pub use bookend::{check_bookends, WindowEndpoint};

pub mod origin;
pub use origin::{espresso_batch_must_be_empty, espresso_l1_origin};

pub mod espresso;
pub use espresso::check_batch_espresso;

pub mod l1_block_info;
pub use l1_block_info::{L1BlockInfoBedrock, L1BlockInfoEcotone, L1BlockInfoTx, L1InfoTxError};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
