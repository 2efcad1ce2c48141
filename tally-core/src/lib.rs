//! tally-core: transaction records, spending taxonomy and batch-level helpers
//! shared by the statement pipeline and its callers.

pub mod category;
pub mod dedup;
pub mod existing;
pub mod record;

pub use category::{Category, categorize};
pub use dedup::{DedupKey, Deduplicator, dedup};
pub use existing::{ExistingRecords, MemoryLedger, filter_existing};
pub use record::{AccountType, ExtractedTransaction, StatementMetadata, source_label, to_cents};
