//! End-to-end statement extraction.
//!
//! bytes -> text blob -> metadata -> dialect -> line outcomes -> records -> dedup

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_core::{Deduplicator, DedupKey, ExtractedTransaction, StatementMetadata, categorize, source_label};

use crate::dates::{DateResolver, YearRollover};
use crate::detect::{DialectScore, score};
use crate::error::ExtractionError;
use crate::metadata::MetadataExtractor;
use crate::parsers::parse_lines;
use crate::text::TextExtractor;
use crate::types::{Dialect, LineOutcome, ParsedLine, SkipReason, StrategyKind};

/// Tunables for one extraction. Every field has a default so partial config
/// files deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Candidate lines shorter than this (after trimming) are ignored
    pub min_line_len: usize,
    pub header_scan_lines: usize,
    /// Exclusive lower bound on the amount magnitude
    pub min_amount: f64,
    /// Exclusive upper bound on the amount magnitude
    pub max_amount: f64,
    pub year_rollover: YearRollover,
    /// Emit bill payments as inflows instead of dropping them
    pub keep_payments: bool,
    pub default_holder: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_line_len: 15,
            header_scan_lines: 20,
            min_amount: 0.01,
            max_amount: 50_000.0,
            year_rollover: YearRollover::NowRelative,
            keep_payments: false,
            default_holder: "Unknown".to_string(),
        }
    }
}

/// Caller-supplied provenance.
#[derive(Debug, Clone, Default)]
pub struct SourceInfo {
    pub filename: Option<String>,
    pub owner_id: String,
}

impl SourceInfo {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self { filename: None, owner_id: owner_id.into() }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    TextExtracted { strategy: &'static str, pages: usize, tables: usize },
    FallbackUsed { reason: String },
    DialectDetected { dialect: Dialect, score: DialectScore },
    LineMatched { line_no: usize, strategy: StrategyKind },
    LineSkipped { line_no: usize, reason: SkipReason },
    DuplicateDropped { key: DedupKey },
}

/// Receives pipeline events as they happen.
pub trait ExtractionObserver: Send + Sync {
    fn on_event(&self, event: &ExtractionEvent);
}

/// Forwards events to the `log` facade.
pub struct LogObserver;

impl ExtractionObserver for LogObserver {
    fn on_event(&self, event: &ExtractionEvent) {
        match event {
            ExtractionEvent::TextExtracted { strategy, pages, tables } => {
                log::debug!("text via {strategy}: {pages} pages, {tables} tables")
            }
            ExtractionEvent::FallbackUsed { reason } => log::warn!("fallback text extraction: {reason}"),
            ExtractionEvent::DialectDetected { dialect, score } => {
                if score.is_tie() {
                    log::warn!(
                        "ambiguous statement format (debit {} / credit {}); using {dialect}",
                        score.debit,
                        score.credit
                    );
                } else {
                    log::debug!("dialect {dialect} (debit {} / credit {})", score.debit, score.credit);
                }
            }
            ExtractionEvent::LineMatched { line_no, strategy } => log::debug!("line {line_no}: matched ({strategy:?})"),
            ExtractionEvent::LineSkipped { line_no, reason } => log::debug!("line {line_no}: skipped ({reason})"),
            ExtractionEvent::DuplicateDropped { key } => log::debug!("duplicate: {key}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionStats {
    /// Lines that produced a record, before duplicate suppression
    pub lines_matched: usize,
    pub duplicates_dropped: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ExtractionStats {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct Extraction {
    /// Survivors in document order
    pub transactions: Vec<ExtractedTransaction>,
    pub metadata: StatementMetadata,
    pub dialect: Dialect,
    pub score: DialectScore,
    pub stats: ExtractionStats,
    /// Text backend used; `None` when text was supplied directly
    pub text_strategy: Option<&'static str>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

pub struct StatementPipeline {
    options: ExtractOptions,
    today: NaiveDate,
    extractor: TextExtractor,
    observers: Vec<Box<dyn ExtractionObserver>>,
}

impl StatementPipeline {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            today: chrono::Local::now().date_naive(),
            extractor: TextExtractor::default(),
            observers: vec![Box::new(LogObserver)],
        }
    }

    /// Fix "today" for the year rollover rule.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_extractor(mut self, extractor: TextExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn ExtractionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn emit(&self, event: ExtractionEvent) {
        for o in &self.observers {
            o.on_event(&event);
        }
    }

    /// Extract transactions from raw PDF bytes.
    pub fn extract(&self, bytes: &[u8], source: &SourceInfo) -> Result<Extraction, ExtractionError> {
        let text = self.extractor.extract(bytes)?;
        if let Some(reason) = &text.fallback_reason {
            self.emit(ExtractionEvent::FallbackUsed { reason: reason.clone() });
        }
        self.emit(ExtractionEvent::TextExtracted {
            strategy: text.strategy,
            pages: text.pages,
            tables: text.tables,
        });

        let mut out = self.extract_text(&text.text, source);
        out.text_strategy = Some(text.strategy);
        Ok(out)
    }

    /// Extract transactions from an already-extracted text blob.
    pub fn extract_text(&self, text: &str, source: &SourceInfo) -> Extraction {
        let metadata = MetadataExtractor::new(self.options.header_scan_lines).extract(text);
        let score = score(text);
        let dialect = score.dialect();
        self.emit(ExtractionEvent::DialectDetected { dialect, score });

        let resolver = DateResolver::new(self.today, self.options.year_rollover)
            .with_period(metadata.period_start, metadata.period_end);
        let label = source_label(
            metadata.holder_or(&self.options.default_holder),
            dialect.account_type(),
            source.filename.as_deref(),
        );

        let mut stats = ExtractionStats::default();
        let mut dedup = Deduplicator::new();
        let mut transactions = Vec::new();

        for outcome in parse_lines(dialect, text, &self.options) {
            let (line_no, raw, parsed) = match outcome {
                LineOutcome::Skipped { line_no, reason } => {
                    self.skip(&mut stats, line_no, reason);
                    continue;
                }
                LineOutcome::Parsed { line_no, raw, parsed } => (line_no, raw, parsed),
            };

            let record = match self.build(&parsed, &resolver, &metadata, dialect, &label, source, raw) {
                Ok(r) => r,
                Err(reason) => {
                    self.skip(&mut stats, line_no, reason);
                    continue;
                }
            };

            stats.lines_matched += 1;
            self.emit(ExtractionEvent::LineMatched { line_no, strategy: parsed.strategy });

            if let Some(key) = dedup.check(&record) {
                self.emit(ExtractionEvent::DuplicateDropped { key });
                continue;
            }
            transactions.push(record);
        }
        stats.duplicates_dropped = dedup.dropped();

        log::info!(
            "{label}: {} transactions ({dialect}), {} matched, {} duplicates, {} skipped",
            transactions.len(),
            stats.lines_matched,
            stats.duplicates_dropped,
            stats.skipped_total()
        );

        Extraction {
            transactions,
            metadata,
            dialect,
            score,
            stats,
            text_strategy: None,
        }
    }

    fn skip(&self, stats: &mut ExtractionStats, line_no: usize, reason: SkipReason) {
        *stats.skipped.entry(reason).or_default() += 1;
        self.emit(ExtractionEvent::LineSkipped { line_no, reason });
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        parsed: &ParsedLine,
        resolver: &DateResolver,
        metadata: &StatementMetadata,
        dialect: Dialect,
        label: &str,
        source: &SourceInfo,
        raw: String,
    ) -> Result<ExtractedTransaction, SkipReason> {
        if !parsed.amount.in_bounds(self.options.min_amount, self.options.max_amount) {
            return Err(SkipReason::AmountOutOfRange);
        }
        let date = resolver
            .resolve(&parsed.trans_date, metadata.statement_year)
            .ok_or(SkipReason::BadDate)?;
        let description = parsed.description.trim();
        if description.is_empty() {
            return Err(SkipReason::ShortDescription);
        }

        Ok(ExtractedTransaction {
            transaction_date: date,
            description: description.to_string(),
            category: categorize(&parsed.category_hint, description),
            amount: parsed.amount.signed(),
            account_type: dialect.account_type(),
            source_label: label.to_string(),
            owner_id: source.owner_id.clone(),
            raw_match: raw,
        })
    }
}

impl Default for StatementPipeline {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}
