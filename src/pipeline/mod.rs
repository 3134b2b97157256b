// Batch scoring across record groups, and ranked views of the results.

pub mod batch;
pub mod rank;

pub use batch::{prepare, run, score_group, score_record, BatchOptions, BatchOutcome, GroupResult, RunMetadata};
pub use rank::{bottom, rank_ascending, rank_descending, top};
