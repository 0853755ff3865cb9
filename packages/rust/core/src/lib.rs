//! Core pipeline orchestration and domain logic for docsplit.
//!
//! This crate ties together discovery, section splitting, page rendering and
//! artifact persistence into one end-to-end run ([`Pipeline::run`]).

pub mod assembler;
pub mod pipeline;
pub mod progress;
pub mod split;

pub use assembler::{Assembler, ProcessedSet};
pub use pipeline::{Pipeline, RunConfig, RunReport, discover, resolve_pattern};
pub use progress::{ProgressReporter, SilentProgress};
pub use split::{flatten, partition, split};
