//! Transcript buffering.
//!
//! # Module Structure
//!
//! - `buffer`: Per-room `TranscriptBuffer` and its `FlushOutcome`
//! - `metadata`: `FlushMetadata` analysis and the dispatchable `TranscriptChunk`

mod buffer;
mod metadata;

pub use buffer::{FlushOutcome, TranscriptBuffer};
pub use metadata::{FlushMetadata, TranscriptChunk};
