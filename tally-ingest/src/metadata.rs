//! Account holder and statement period from the header region.
//!
//! Expected header shapes:
//!   JANE Q PUBLIC
//!   Prepared for: JANE OGHENERUEMU AGBAOHWO October 16 to November 15, 2024
//!   JANE AGBAOHWO                                For Jul 1 to Jul 31, 2024
//!   Statement date: November 15, 2024

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use tally_core::StatementMetadata;

use crate::dates::parse_month;

/// Terms that disqualify an all-caps line from being a holder name.
const BOILERPLATE: &[&str] = &[
    "ACCOUNT",
    "STATEMENT",
    "CARD",
    "BANK",
    "BALANCE",
    "TRANSACTION",
    "CHARGES",
    "CREDITS",
    "SUMMARY",
    "DETAILS",
    "PAYMENT",
    "VISA",
    "MASTERCARD",
    "DIVIDEND",
    "TOTAL",
    "PAGE",
];

static PREPARED_FOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)prepared\s+for\s*:?\s*(?P<rest>.+)$").unwrap());

static NAME_FOR_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<name>[A-Z][A-Z'\-]+(?:\s+[A-Z][A-Z'\-]+)+)\s+For\s+",
        r"(?P<start>[A-Za-z]{3,9}\.?\s+\d{1,2})\s+to\s+",
        r"(?P<end>[A-Za-z]{3,9}\.?\s+\d{1,2}),?\s*(?P<year>\d{4})"
    ))
    .unwrap()
});

static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<start>[A-Za-z]{3,9}\.?\s+\d{1,2})(?:,\s*(?P<start_year>\d{4}))?\s+to\s+",
        r"(?P<end>[A-Za-z]{3,9}\.?\s+\d{1,2}),\s*(?P<year>\d{4})"
    ))
    .unwrap()
});

static SINGLE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<date>[A-Za-z]{3,9}\.?\s+\d{1,2}),\s*(?P<year>\d{4})").unwrap()
});

#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    header_lines: usize,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(20)
    }
}

impl MetadataExtractor {
    pub fn new(header_lines: usize) -> Self {
        Self { header_lines }
    }

    /// Best-effort header scan. Missing fields are left `None`.
    pub fn extract(&self, text: &str) -> StatementMetadata {
        let header: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(self.header_lines)
            .collect();

        let mut meta = StatementMetadata::default();

        let name_with_period = header.iter().find_map(|l| NAME_FOR_PERIOD_RE.captures(l));
        if let Some(caps) = &name_with_period {
            let year: i32 = caps["year"].parse().unwrap_or_default();
            if let Some((start, end)) = period_dates(&caps["start"], &caps["end"], None, year) {
                meta.period_start = Some(start);
                meta.period_end = Some(end);
                meta.statement_year = Some(end.year());
            }
        }

        meta.holder_name = header
            .iter()
            .find_map(|l| caps_name(l))
            .or_else(|| header.iter().find_map(|l| prepared_for_name(l)))
            .or_else(|| name_with_period.as_ref().map(|c| collapse(&c["name"])));

        if meta.period_end.is_none() {
            scan_period(&header, &mut meta);
        }

        log::debug!(
            "statement metadata: holder={:?} period={:?}..{:?} year={:?}",
            meta.holder_name,
            meta.period_start,
            meta.period_end,
            meta.statement_year
        );
        meta
    }
}

/// (a) A bare all-caps name line.
fn caps_name(line: &str) -> Option<String> {
    let len = line.chars().count();
    if !(8..=50).contains(&len) || !line.contains(' ') {
        return None;
    }
    if line.split_whitespace().count() < 2 {
        return None;
    }
    let name_chars = line
        .chars()
        .all(|c| c.is_ascii_uppercase() || c == ' ' || c == '\'' || c == '-' || c == '.');
    if !name_chars {
        return None;
    }
    if BOILERPLATE.iter().any(|b| line.contains(b)) {
        return None;
    }
    Some(collapse(line))
}

/// (b) `Prepared for: NAME ...`; the name is the run of all-caps words.
fn prepared_for_name(line: &str) -> Option<String> {
    let caps = PREPARED_FOR_RE.captures(line)?;
    let words: Vec<&str> = caps["rest"]
        .split_whitespace()
        .take_while(|w| {
            w.chars().any(|c| c.is_ascii_alphabetic())
                && w.chars().all(|c| c.is_ascii_uppercase() || c == '\'' || c == '-' || c == '.')
        })
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}

/// Second pass: `<Month> <Day> to <Month> <Day>, <Year>`, else a single
/// `<Month> <Day>, <Year>` on or right after a line mentioning "statement".
fn scan_period(header: &[&str], meta: &mut StatementMetadata) {
    for line in header {
        if let Some(caps) = PERIOD_RE.captures(line) {
            let year: i32 = caps["year"].parse().unwrap_or_default();
            let start_year = caps.name("start_year").and_then(|m| m.as_str().parse().ok());
            if let Some((start, end)) = period_dates(&caps["start"], &caps["end"], start_year, year) {
                meta.period_start = Some(start);
                meta.period_end = Some(end);
                meta.statement_year = Some(end.year());
                return;
            }
        }
    }

    for (i, line) in header.iter().enumerate() {
        if !line.to_lowercase().contains("statement") {
            continue;
        }
        let candidates = std::iter::once(*line).chain(header.get(i + 1).copied());
        for candidate in candidates {
            if let Some(caps) = SINGLE_DATE_RE.captures(candidate) {
                let year: i32 = caps["year"].parse().unwrap_or_default();
                if let Some(date) = month_day_year(&caps["date"], year) {
                    meta.period_end = Some(date);
                    meta.statement_year = Some(year);
                    return;
                }
            }
        }
    }
}

/// Start/end dates of a period whose year is printed once at the end.
/// A start month after the end month means the period crosses New Year.
fn period_dates(start: &str, end: &str, start_year: Option<i32>, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let end_date = month_day_year(end, year)?;
    let (sm, _) = month_day(start)?;
    let start_year = start_year.unwrap_or(if sm > end_date.month() { year - 1 } else { year });
    let start_date = month_day_year(start, start_year)?;
    Some((start_date, end_date))
}

fn month_day(token: &str) -> Option<(u32, u32)> {
    let mut parts = token.split_whitespace();
    let month = parse_month(parts.next()?)?;
    let day = parts.next()?.parse().ok()?;
    Some((month, day))
}

fn month_day_year(token: &str, year: i32) -> Option<NaiveDate> {
    let (m, d) = month_day(token)?;
    NaiveDate::from_ymd_opt(year, m, d)
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
