//! PDF bytes to one annotated text blob.
//!
//! Output layout:
//!   === PAGE 1 ===
//!   <page text>
//!   === TABLE 1 (page 1) ===
//!   Oct 13 | Oct 15 | Lovisa | Alberta | AB | Retail and Grocery | 29.39
//!   === PAGE 2 ===
//!   ...
//!
//! The primary strategy emits page text plus column-aligned tables; the
//! fallback re-reads plain per-page text with a different PDF backend.

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::ExtractionError;

static CELL_GAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\t|\s{2,}").unwrap());

const MIN_TABLE_CELLS: usize = 4;
const MIN_TABLE_ROWS: usize = 2;

pub fn page_marker(page: usize) -> String {
    format!("=== PAGE {page} ===")
}

pub fn table_marker(table: usize, page: usize) -> String {
    format!("=== TABLE {table} (page {page}) ===")
}

/// Page or table delimiter inserted by the extractor.
pub fn is_boundary(line: &str) -> bool {
    let t = line.trim();
    t.starts_with("=== ") && t.ends_with(" ===")
}

pub fn is_table_boundary(line: &str) -> bool {
    is_boundary(line) && line.trim().starts_with("=== TABLE")
}

/// A PDF text backend returning one string per page.
pub trait PageSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn pages(&self, bytes: &[u8]) -> Result<Vec<String>>;
}

/// `pdf-extract` over the whole document; pages split on form feeds.
pub struct PdfExtractPages;

impl PageSource for PdfExtractPages {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed fonts; treat that as a failure
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| anyhow!("pdf-extract panicked"))?
            .map_err(|e| anyhow!("pdf-extract: {e}"))?;
        Ok(text.split('\x0C').map(str::to_string).collect())
    }
}

/// `lopdf` page-by-page text.
pub struct LopdfPages;

impl PageSource for LopdfPages {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(bytes).context("lopdf: load")?;
        let mut out = Vec::new();
        for page_num in doc.get_pages().keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(t) => out.push(t),
                Err(e) => log::warn!("lopdf: page {page_num} unreadable: {e}"),
            }
        }
        Ok(out)
    }
}

/// Text blob plus how it was obtained.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub strategy: &'static str,
    pub pages: usize,
    pub tables: usize,
    /// Why the primary strategy was abandoned, when it was
    pub fallback_reason: Option<String>,
}

pub struct TextExtractor {
    primary: Box<dyn PageSource>,
    fallback: Box<dyn PageSource>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::with_sources(Box::new(PdfExtractPages), Box::new(LopdfPages))
    }
}

impl TextExtractor {
    pub fn with_sources(primary: Box<dyn PageSource>, fallback: Box<dyn PageSource>) -> Self {
        Self { primary, fallback }
    }

    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        let primary_err = match usable_pages(self.primary.as_ref(), bytes) {
            Ok(pages) => return Ok(assemble(&pages, true, self.primary.name(), None)),
            Err(e) => format!("{}: {e:#}", self.primary.name()),
        };
        log::warn!("primary text extraction failed ({primary_err}); retrying plain text");

        match usable_pages(self.fallback.as_ref(), bytes) {
            Ok(pages) => Ok(assemble(&pages, false, self.fallback.name(), Some(primary_err))),
            Err(e) => Err(ExtractionError::no_text(vec![
                primary_err,
                format!("{}: {e:#}", self.fallback.name()),
            ])),
        }
    }
}

fn usable_pages(source: &dyn PageSource, bytes: &[u8]) -> Result<Vec<String>> {
    let pages = source.pages(bytes)?;
    if pages.iter().all(|p| p.trim().is_empty()) {
        return Err(anyhow!("empty result"));
    }
    Ok(pages)
}

fn assemble(pages: &[String], with_tables: bool, strategy: &'static str, fallback_reason: Option<String>) -> ExtractedText {
    let mut text = String::new();
    let mut table_no = 0;

    for (i, page) in pages.iter().enumerate() {
        let page_no = i + 1;
        text.push_str(&page_marker(page_no));
        text.push('\n');
        text.push_str(page.trim_end());
        text.push('\n');

        if with_tables {
            for table in detect_tables(page) {
                table_no += 1;
                text.push_str(&table_marker(table_no, page_no));
                text.push('\n');
                for row in table {
                    text.push_str(&row.join(" | "));
                    text.push('\n');
                }
            }
        }
    }

    log::debug!(
        "extracted {} chars via {strategy}: {} pages, {table_no} tables",
        text.len(),
        pages.len()
    );

    ExtractedText {
        text,
        strategy,
        pages: pages.len(),
        tables: table_no,
        fallback_reason,
    }
}

fn split_cells(line: &str) -> Vec<String> {
    CELL_GAP_RE
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Runs of consecutive column-aligned lines (cells separated by 2+ spaces).
pub fn detect_tables(page: &str) -> Vec<Vec<Vec<String>>> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in page.lines() {
        let cells = split_cells(line);
        if cells.len() >= MIN_TABLE_CELLS {
            current.push(cells);
            continue;
        }
        if current.len() >= MIN_TABLE_ROWS {
            tables.push(std::mem::take(&mut current));
        } else {
            current.clear();
        }
    }
    if current.len() >= MIN_TABLE_ROWS {
        tables.push(current);
    }

    tables
}
