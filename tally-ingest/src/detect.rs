//! Credit vs. debit dialect detection by weighted keyword counts.

use serde::Serialize;

use crate::types::Dialect;

pub const DEBIT_MARKERS: &[&str] = &[
    "TRANSACTION DETAILS",
    "WITHDRAWALS ($)",
    "DEPOSITS ($)",
    "BALANCE ($)",
    "VISA DEBIT RETAIL PURCHASE",
    "ACCOUNT SUMMARY",
];

pub const CREDIT_MARKERS: &[&str] = &[
    "YOUR NEW CHARGES",
    "SPEND CATEGORIES",
    "CARD NUMBER",
    "DIVIDEND",
    "VISA CARD",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DialectScore {
    pub debit: usize,
    pub credit: usize,
}

impl DialectScore {
    /// Debit only on a strict win; ties (including 0/0) resolve to credit.
    pub fn dialect(&self) -> Dialect {
        if self.debit > self.credit { Dialect::Debit } else { Dialect::Credit }
    }

    pub fn is_tie(&self) -> bool {
        self.debit == self.credit
    }
}

fn count_markers(upper: &str, markers: &[&str]) -> usize {
    markers.iter().map(|m| upper.matches(m).count()).sum()
}

/// Score the whole text blob.
pub fn score(text: &str) -> DialectScore {
    let upper = text.to_uppercase();
    DialectScore {
        debit: count_markers(&upper, DEBIT_MARKERS),
        credit: count_markers(&upper, CREDIT_MARKERS),
    }
}

pub fn detect(text: &str) -> Dialect {
    score(text).dialect()
}
