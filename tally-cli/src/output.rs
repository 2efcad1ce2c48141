use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tally_core::{ExtractedTransaction, StatementMetadata};
use tally_ingest::{Dialect, DialectScore, ExtractionStats};

use crate::config::OutputFormat;

/// What `tally extract` reports for one file.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub file: String,
    pub dialect: Dialect,
    pub score: DialectScore,
    pub metadata: &'a StatementMetadata,
    pub stats: &'a ExtractionStats,
    /// Dropped because the ledger already holds them
    pub already_recorded: usize,
    pub transactions: &'a [ExtractedTransaction],
}

pub fn render(report: &Report<'_>, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_csv(report.transactions, out)?,
        OutputFormat::Table => write_table(report, out)?,
    }
    Ok(())
}

fn write_csv(txns: &[ExtractedTransaction], out: &mut dyn Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for t in txns {
        wtr.serialize(t)?;
    }
    wtr.flush()?;
    Ok(())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
    t.push('~');
    t
}

fn write_table(report: &Report<'_>, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{} ({}, holder: {})",
        report.file,
        report.dialect,
        report.metadata.holder_name.as_deref().unwrap_or("unknown")
    )?;
    writeln!(out)?;
    writeln!(out, "{:<10}  {:<40}  {:<36}  {:>10}", "Date", "Description", "Category", "Amount")?;
    for t in report.transactions {
        writeln!(
            out,
            "{:<10}  {:<40}  {:<36}  {:>10.2}",
            t.transaction_date,
            truncate(&t.description, 40),
            t.category.label(),
            t.amount
        )?;
    }

    // Totals in cents; an empty f64 sum is -0.0 and prints as "$-0.00".
    let outflow: i64 = report.transactions.iter().filter(|t| t.is_outflow()).map(|t| t.amount_cents()).sum();
    let inflow: i64 = report.transactions.iter().filter(|t| t.is_inflow()).map(|t| -t.amount_cents()).sum();
    writeln!(out)?;
    writeln!(
        out,
        "{} transactions | out ${:.2} | in ${:.2} | {} duplicates | {} skipped",
        report.transactions.len(),
        outflow as f64 / 100.0,
        inflow as f64 / 100.0,
        report.stats.duplicates_dropped,
        report.stats.skipped_total()
    )?;
    if report.already_recorded > 0 {
        writeln!(out, "{} already recorded in ledger", report.already_recorded)?;
    }
    Ok(())
}
