//! Credit card charge list parser.
//!
//! Expected rows after PDF-to-text:
//!   Trans    Post
//!   date     date     Description                           Spend Categories       Amount($)
//!   Oct 26   Oct 28   JOHN & ROSS / AC CALG   CALG   AB     Retail and Grocery     90.34
//!   Sep 23   Sep 24   AMZN Mktp CA  WWW.AMAZON.CAON  Personal and Household Expenses  -53.54
//! and, from derived tables:
//!   Oct 13 | Oct 15 | Lovisa | Alberta | AB | Retail and Grocery | 29.39

use regex::Regex;
use std::sync::LazyLock;
use tally_core::Category;

use crate::amount::{AmountToken, find_amounts, has_amount};
use crate::dates::{MONTH, has_month_day, split_month_day};
use crate::filters::{is_column_header, is_header_line, is_payment_text};
use crate::text::is_boundary;
use crate::types::{LineOutcome, ParsedLine, SkipReason, StrategyKind};

static DATE_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<trans>{MONTH}\.?\s+\d{{1,2}})\s+(?P<post>{MONTH}\.?\s+\d{{1,2}})\s+(?P<rest>.+)$"
    ))
    .unwrap()
});

static CATEGORY_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        concat!(
            r"^(?P<trans>(?i:{m})\.?\s+\d{{1,2}})\s+",
            r"(?:(?P<post>(?i:{m})\.?\s+\d{{1,2}})\s+)?",
            r"(?P<desc>.+?)\s+",
            r"(?P<cat>[A-Z][a-z]+(?:,?\s+(?:and\s+)?[A-Z][a-z]+)*)\s+",
            r"(?P<amt>(?:-\s*)?\(?-?\$?[\d,]+\.\d{{2}}\)?)\s*$"
        ),
        m = MONTH
    ))
    .unwrap()
});

static GAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Credit row strategies, tried in order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditStrategy {
    /// Last amount on the line, date pair at the start, the middle split into
    /// description and category.
    AmountAnchored,
    /// Description followed by a capitalized category phrase; post date optional.
    CategoryPhrase,
    /// `date | date | description ... | category | amount`
    PipeRow,
}

impl CreditStrategy {
    pub const CHAIN: [CreditStrategy; 3] = [
        CreditStrategy::AmountAnchored,
        CreditStrategy::CategoryPhrase,
        CreditStrategy::PipeRow,
    ];

    pub fn kind(&self) -> StrategyKind {
        match self {
            CreditStrategy::AmountAnchored => StrategyKind::AmountAnchored,
            CreditStrategy::CategoryPhrase => StrategyKind::CategoryPhrase,
            CreditStrategy::PipeRow => StrategyKind::PipeRow,
        }
    }

    pub fn apply(&self, line: &str) -> Option<ParsedLine> {
        match self {
            CreditStrategy::AmountAnchored => amount_anchored(line),
            CreditStrategy::CategoryPhrase => category_phrase(line),
            CreditStrategy::PipeRow => pipe_row(line),
        }
    }
}

fn amount_anchored(line: &str) -> Option<ParsedLine> {
    if line.contains('|') {
        return None;
    }
    let amount = find_amounts(line).pop()?;
    let head = line[..amount.start].trim();
    let caps = DATE_PAIR_RE.captures(head)?;
    let (description, category_hint) = split_category(caps["rest"].trim());

    Some(ParsedLine {
        trans_date: caps["trans"].to_string(),
        post_date: Some(caps["post"].to_string()),
        description,
        category_hint,
        amount,
        strategy: StrategyKind::AmountAnchored,
    })
}

fn category_phrase(line: &str) -> Option<ParsedLine> {
    if line.contains('|') {
        return None;
    }
    let caps = CATEGORY_PHRASE_RE.captures(line)?;
    let amount = find_amounts(&caps["amt"]).pop()?;

    Some(ParsedLine {
        trans_date: caps["trans"].to_string(),
        post_date: caps.name("post").map(|m| m.as_str().to_string()),
        description: collapse(&caps["desc"]),
        category_hint: collapse(&caps["cat"]),
        amount,
        strategy: StrategyKind::CategoryPhrase,
    })
}

fn pipe_row(line: &str) -> Option<ParsedLine> {
    if !line.contains('|') {
        return None;
    }
    let cells: Vec<&str> = line.split('|').map(str::trim).filter(|c| !c.is_empty()).collect();
    if cells.len() < 4 || split_month_day(cells[0]).is_none() {
        return None;
    }

    let amount = single_amount(cells[cells.len() - 1])?;
    let has_post = split_month_day(cells[1]).is_some();
    let first_desc = if has_post { 2 } else { 1 };
    if cells.len() < first_desc + 3 {
        return None;
    }
    let category = cells[cells.len() - 2];
    let description = cells[first_desc..cells.len() - 2].join(" ");

    Some(ParsedLine {
        trans_date: cells[0].to_string(),
        post_date: has_post.then(|| cells[1].to_string()),
        description: collapse(&description),
        category_hint: category.to_string(),
        amount,
        strategy: StrategyKind::PipeRow,
    })
}

/// The cell is exactly one amount token.
fn single_amount(cell: &str) -> Option<AmountToken> {
    let mut amts = find_amounts(cell);
    if amts.len() != 1 {
        return None;
    }
    let amt = amts.pop()?;
    (amt.start == 0 && amt.end == cell.len()).then_some(amt)
}

/// Split `"<description> <category>"`: a known category label at the end
/// (longest first), else the last 2+ space gap, else no category.
pub fn split_category(combined: &str) -> (String, String) {
    for cat in Category::by_label_length() {
        let label = cat.label();
        if combined.len() <= label.len() {
            continue;
        }
        let at = combined.len() - label.len();
        if !combined.is_char_boundary(at) || !combined[at..].eq_ignore_ascii_case(label) {
            continue;
        }
        let desc = &combined[..at];
        if desc.ends_with(char::is_whitespace) && !desc.trim().is_empty() {
            return (collapse(desc), label.to_string());
        }
    }

    if let Some(gap) = GAP_RE.find_iter(combined).last() {
        let desc = combined[..gap.start()].trim();
        let cat = combined[gap.end()..].trim();
        if !desc.is_empty() {
            return (collapse(desc), collapse(cat));
        }
    }

    (collapse(combined), String::new())
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct CreditParser {
    min_line_len: usize,
    keep_payments: bool,
    chain: Vec<CreditStrategy>,
}

impl CreditParser {
    pub fn new(min_line_len: usize, keep_payments: bool) -> Self {
        Self {
            min_line_len,
            keep_payments,
            chain: CreditStrategy::CHAIN.to_vec(),
        }
    }

    /// Restrict or reorder the strategy chain.
    pub fn with_chain(mut self, chain: Vec<CreditStrategy>) -> Self {
        self.chain = chain;
        self
    }

    /// Classify a single line; `None` means "not a transaction candidate".
    pub fn parse_line(&self, line_no: usize, raw: &str) -> Option<LineOutcome> {
        let line = raw.trim();
        // column headings sit alone on their line, so check before the candidate test
        if is_column_header(line) {
            return Some(LineOutcome::Skipped { line_no, reason: SkipReason::Header });
        }
        if line.chars().count() < self.min_line_len || is_boundary(line) {
            return None;
        }
        if !has_month_day(line) || !has_amount(line) {
            return None;
        }

        // payment rows are governed by the payment policy, not the header filter
        if !is_payment_text(line) && is_header_line(line) {
            return Some(LineOutcome::Skipped { line_no, reason: SkipReason::Header });
        }

        let Some(mut parsed) = self.chain.iter().find_map(|s| s.apply(line)) else {
            return Some(LineOutcome::Skipped { line_no, reason: SkipReason::Unparsed });
        };

        let combined = format!("{} {}", parsed.description, parsed.category_hint);
        if is_payment_text(&combined) {
            if !self.keep_payments {
                return Some(LineOutcome::Skipped { line_no, reason: SkipReason::Payment });
            }
            parsed.amount.negative = true;
        }

        Some(LineOutcome::Parsed { line_no, raw: line.to_string(), parsed })
    }

    pub fn parse(&self, text: &str) -> Vec<LineOutcome> {
        text.lines()
            .enumerate()
            .filter_map(|(i, raw)| self.parse_line(i + 1, raw))
            .collect()
    }
}
