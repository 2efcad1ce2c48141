//! Short-form statement dates ("Oct 22") to calendar dates.
//!
//! Rows only carry month and day. The year comes from the statement header
//! when it was found, otherwise from a rollover heuristic relative to "today".

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub(crate) const MONTH: &str = concat!(
    r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?",
    r"|sep(?:t|tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)",
);

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b{MONTH}\.?\s+\d{{1,2}}\b")).unwrap()
});

static LEADING_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^{MONTH}\.?\s+\d{{1,2}}\b")).unwrap()
});

/// How to pick a year when the statement header did not yield one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum YearRollover {
    /// Oct-Dec resolve to last year; Jan-Mar resolve to next year when today is
    /// in the second half of the year; everything else uses this year.
    #[default]
    NowRelative,
    /// Same as `NowRelative` except Oct-Dec always resolve to the given year.
    Pinned(i32),
}

/// Month number for a month name or abbreviation (first three letters).
pub fn parse_month(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Split `"Oct 22"` into `(10, 22)`.
pub fn split_month_day(token: &str) -> Option<(u32, u32)> {
    let parts: Vec<_> = token.split_whitespace().collect();
    if parts.len() != 2 {
        return None;
    }
    let month = parse_month(parts[0].trim_end_matches('.'))?;
    let day: u32 = parts[1].trim_end_matches(',').parse().ok()?;
    Some((month, day))
}

/// True when the line contains a `Mon D` token anywhere.
pub fn has_month_day(line: &str) -> bool {
    MONTH_DAY_RE.is_match(line)
}

/// `Mon D` token at the very start of `line`, with its end offset.
pub fn leading_date(line: &str) -> Option<(&str, usize)> {
    LEADING_DATE_RE.find(line).map(|m| (m.as_str(), m.end()))
}

#[derive(Debug, Clone)]
pub struct DateResolver {
    today: NaiveDate,
    rollover: YearRollover,
    period: Option<(NaiveDate, NaiveDate)>,
}

impl DateResolver {
    pub fn new(today: NaiveDate, rollover: YearRollover) -> Self {
        Self { today, rollover, period: None }
    }

    /// Statement period; used to split years for periods spanning New Year.
    pub fn with_period(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.period = start.zip(end);
        self
    }

    /// Resolve a `Mon D` token. `None` for unknown months, non-numeric days or
    /// impossible dates.
    pub fn resolve(&self, token: &str, statement_year: Option<i32>) -> Option<NaiveDate> {
        let (month, day) = split_month_day(token)?;
        let year = match (self.period, statement_year) {
            (Some((start, end)), Some(_)) if start.year() != end.year() => {
                if month >= start.month() { start.year() } else { end.year() }
            }
            (_, Some(y)) => y,
            (_, None) => self.rollover_year(month),
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn rollover_year(&self, month: u32) -> i32 {
        let now_year = self.today.year();
        match month {
            10..=12 => match self.rollover {
                YearRollover::NowRelative => now_year - 1,
                YearRollover::Pinned(y) => y,
            },
            1..=3 if self.today.month() > 6 => now_year + 1,
            _ => now_year,
        }
    }
}

/// One-shot resolution with the default rollover rule.
pub fn parse_date(token: &str, statement_year: Option<i32>, today: NaiveDate) -> Option<NaiveDate> {
    DateResolver::new(today, YearRollover::NowRelative).resolve(token, statement_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_known_year() {
        assert_eq!(parse_date("Oct 22", Some(2024), ymd(2025, 7, 15)), Some(ymd(2024, 10, 22)));
    }

    #[test]
    fn test_rollover_from_july() {
        let today = ymd(2025, 7, 15);
        assert_eq!(parse_date("Oct 22", None, today), Some(ymd(2024, 10, 22)));
        assert_eq!(parse_date("Feb 3", None, today), Some(ymd(2026, 2, 3)));
        assert_eq!(parse_date("Jul 2", None, today), Some(ymd(2025, 7, 2)));
    }

    #[test]
    fn test_rollover_early_in_year() {
        let today = ymd(2025, 2, 10);
        assert_eq!(parse_date("Jan 5", None, today), Some(ymd(2025, 1, 5)));
        assert_eq!(parse_date("Dec 30", None, today), Some(ymd(2024, 12, 30)));
    }

    #[test]
    fn test_pinned_rollover() {
        let r = DateResolver::new(ymd(2026, 10, 17), YearRollover::Pinned(2024));
        assert_eq!(r.resolve("Nov 14", None), Some(ymd(2024, 11, 14)));
        assert_eq!(r.resolve("May 1", None), Some(ymd(2026, 5, 1)));
    }

    #[test]
    fn test_period_spanning_new_year() {
        let r = DateResolver::new(ymd(2026, 1, 1), YearRollover::NowRelative)
            .with_period(Some(ymd(2024, 12, 16)), Some(ymd(2025, 1, 15)));
        assert_eq!(r.resolve("Dec 20", Some(2025)), Some(ymd(2024, 12, 20)));
        assert_eq!(r.resolve("Jan 3", Some(2025)), Some(ymd(2025, 1, 3)));
    }

    #[test]
    fn test_malformed_tokens() {
        let today = ymd(2025, 7, 15);
        assert_eq!(parse_date("Foo 22", Some(2024), today), None);
        assert_eq!(parse_date("Oct xx", Some(2024), today), None);
        assert_eq!(parse_date("Feb 30", Some(2024), today), None);
        assert_eq!(parse_date("Oct", Some(2024), today), None);
    }

    #[test]
    fn test_variants_and_detection() {
        assert_eq!(split_month_day("Sept 5"), Some((9, 5)));
        assert_eq!(split_month_day("OCT. 13"), Some((10, 13)));
        assert!(has_month_day("  Nov 01   Nov 01   WINNERS"));
        assert!(!has_month_day("Account number: 56-80581"));
        assert_eq!(leading_date("Jul 2    VISA DEBIT").map(|(d, _)| d), Some("Jul 2"));
        assert!(leading_date("   VISA DEBIT 3.70").is_none());
    }
}
