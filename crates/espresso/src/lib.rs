#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations, missing_docs, unreachable_pub, rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![no_std]

extern crate alloc;

pub mod commit;
pub use commit::{Commitment, RawCommitmentBuilder};

pub mod types;
pub use types::{Bytes, Header, L1BlockInfo, NmtProof, NmtRoot};

pub mod legacy;

pub mod query;
pub use query::{QueryService, TransactionsInBlock, WindowMore, WindowStart};

pub mod nmt;
