//! Boundary with the persistence collaborator.
//!
//! Cross-batch duplicate suppression lives with whoever stores records; the
//! pipeline only needs a yes/no lookup.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::record::{ExtractedTransaction, to_cents};

/// Lookup into previously stored transactions.
pub trait ExistingRecords {
    fn find_existing(&self, owner_id: &str, date: NaiveDate, description: &str, amount: f64) -> bool;
}

/// In-memory store keyed on (owner, date, description, cents).
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    entries: HashSet<(String, NaiveDate, String, i64)>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, owner_id: &str, date: NaiveDate, description: &str, amount: f64) {
        self.entries.insert((
            owner_id.to_string(),
            date,
            description.trim().to_string(),
            to_cents(amount),
        ));
    }

    pub fn record(&mut self, txn: &ExtractedTransaction) {
        self.insert(&txn.owner_id, txn.transaction_date, &txn.description, txn.amount);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExistingRecords for MemoryLedger {
    fn find_existing(&self, owner_id: &str, date: NaiveDate, description: &str, amount: f64) -> bool {
        self.entries.contains(&(
            owner_id.to_string(),
            date,
            description.trim().to_string(),
            to_cents(amount),
        ))
    }
}

/// Split a batch into (new, already stored).
pub fn filter_existing<S: ExistingRecords + ?Sized>(
    store: &S,
    txns: Vec<ExtractedTransaction>,
) -> (Vec<ExtractedTransaction>, Vec<ExtractedTransaction>) {
    txns.into_iter().partition(|t| {
        !store.find_existing(&t.owner_id, t.transaction_date, &t.description, t.amount)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::record::AccountType;

    fn txn(owner: &str, desc: &str, amount: f64) -> ExtractedTransaction {
        ExtractedTransaction {
            transaction_date: NaiveDate::from_ymd_opt(2024, 11, 14).unwrap(),
            description: desc.to_string(),
            category: Category::RetailAndGrocery,
            amount,
            account_type: AccountType::CreditCard,
            source_label: "X - Credit Card".to_string(),
            owner_id: owner.to_string(),
            raw_match: String::new(),
        }
    }

    #[test]
    fn test_filter_existing_partitions() {
        let mut ledger = MemoryLedger::new();
        ledger.record(&txn("u1", "DOLLARAMA #504 CALGARY AB", 54.34));

        let (fresh, known) = filter_existing(
            &ledger,
            vec![
                txn("u1", "DOLLARAMA #504 CALGARY AB", 54.34),
                txn("u2", "DOLLARAMA #504 CALGARY AB", 54.34),
                txn("u1", "SKY 360 CALGARY AB", 23.16),
            ],
        );
        assert_eq!(known.len(), 1);
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[0].owner_id, "u2");
    }

    #[test]
    fn test_amount_compared_in_cents() {
        let mut ledger = MemoryLedger::new();
        ledger.insert("u1", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), "X", 0.1 + 0.2);
        assert!(ledger.find_existing("u1", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), " X ", 0.30));
    }
}
