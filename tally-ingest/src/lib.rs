//! tally-ingest: bank statement PDFs to normalized transactions.
//!
//! Text extraction with fallback, header metadata, credit/debit dialect
//! detection, per-dialect line parsers and the `StatementPipeline` that ties
//! them together.

pub mod amount;
pub mod dates;
pub mod detect;
pub mod error;
pub mod filters;
pub mod metadata;
pub mod parsers;
pub mod pipeline;
pub mod text;
pub mod types;

pub use amount::{AmountToken, find_amounts};
pub use dates::{DateResolver, YearRollover, parse_date};
pub use detect::{DialectScore, detect, score};
pub use error::ExtractionError;
pub use metadata::MetadataExtractor;
pub use parsers::parse_lines;
pub use pipeline::{
    ExtractOptions, Extraction, ExtractionEvent, ExtractionObserver, ExtractionStats, LogObserver, SourceInfo,
    StatementPipeline,
};
pub use text::{ExtractedText, LopdfPages, PageSource, PdfExtractPages, TextExtractor};
pub use types::{Dialect, LineOutcome, ParsedLine, SkipReason, StrategyKind};
