//! Intra-batch duplicate suppression.
//!
//! The same transaction can be encountered twice in one document (once in the
//! running text and once in a derived table). Two records are the same when
//! they share date, the first three words of the description and amount.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::record::ExtractedTransaction;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub date: NaiveDate,
    pub head: String,
    pub amount_cents: i64,
}

impl DedupKey {
    pub fn of(txn: &ExtractedTransaction) -> Self {
        Self {
            date: txn.transaction_date,
            head: description_head(&txn.description),
            amount_cents: txn.amount_cents(),
        }
    }
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | {:.2}",
            self.date,
            self.head,
            self.amount_cents as f64 / 100.0
        )
    }
}

/// First three whitespace-separated words, lowercased.
fn description_head(description: &str) -> String {
    description
        .split_whitespace()
        .take(3)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps the first occurrence of every key, in encounter order.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<DedupKey>,
    dropped: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when `txn` is new, or the key it collided on.
    pub fn check(&mut self, txn: &ExtractedTransaction) -> Option<DedupKey> {
        let key = DedupKey::of(txn);
        if self.seen.contains(&key) {
            self.dropped += 1;
            log::debug!("duplicate dropped: {}", key);
            Some(key)
        } else {
            self.seen.insert(key);
            None
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Collapse repeated records, returning survivors and the number dropped.
pub fn dedup(txns: Vec<ExtractedTransaction>) -> (Vec<ExtractedTransaction>, usize) {
    let mut dd = Deduplicator::new();
    let kept: Vec<_> = txns.into_iter().filter(|t| dd.check(t).is_none()).collect();
    (kept, dd.dropped())
}
