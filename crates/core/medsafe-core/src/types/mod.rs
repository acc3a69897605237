//! Core data types

mod interaction;
mod report;

pub use interaction::{
    BlockReason, BlockSeverity, InteractionRecord, InteractionResult, RecordSource,
    SafetyBlockResult, Severity, SAFETY_BLOCK_MECHANISM,
};
pub use report::InteractionReport;
