//! CSV ledger of recorded transactions.
//!
//! Columns:
//!   owner_id,date,description,amount,category,account_type,source_label
//!
//! Backs cross-upload duplicate suppression for the CLI.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tally_core::{AccountType, Category, ExistingRecords, ExtractedTransaction, MemoryLedger};

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    owner_id: String,
    date: NaiveDate,
    description: String,
    amount: f64,
    category: Category,
    account_type: AccountType,
    source_label: String,
}

impl From<&ExtractedTransaction> for LedgerRow {
    fn from(t: &ExtractedTransaction) -> Self {
        Self {
            owner_id: t.owner_id.clone(),
            date: t.transaction_date,
            description: t.description.clone(),
            amount: t.amount,
            category: t.category,
            account_type: t.account_type,
            source_label: t.source_label.clone(),
        }
    }
}

pub struct CsvLedger {
    path: PathBuf,
    index: MemoryLedger,
}

impl CsvLedger {
    /// Load the ledger at `path`; a missing file is an empty ledger.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut index = MemoryLedger::new();

        if path.exists() {
            let mut rdr = csv::Reader::from_path(&path).with_context(|| format!("opening {}", path.display()))?;
            for (i, row) in rdr.deserialize::<LedgerRow>().enumerate() {
                let row = row.with_context(|| format!("{} row {}", path.display(), i + 2))?;
                index.insert(&row.owner_id, row.date, &row.description, row.amount);
            }
        }

        log::debug!("ledger {}: {} records", path.display(), index.len());
        Ok(Self { path, index })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Append `txns`, writing the header row when the file is new.
    pub fn append(&mut self, txns: &[ExtractedTransaction]) -> Result<()> {
        let is_new = !self.path.exists() || std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;

        let mut wtr = csv::WriterBuilder::new().has_headers(is_new).from_writer(file);
        for t in txns {
            wtr.serialize(LedgerRow::from(t))?;
            self.index.record(t);
        }
        wtr.flush().with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

impl ExistingRecords for CsvLedger {
    fn find_existing(&self, owner_id: &str, date: NaiveDate, description: &str, amount: f64) -> bool {
        self.index.find_existing(owner_id, date, description, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::filter_existing;

    fn temp_ledger(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tally-ledger-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("ledger.csv")
    }

    fn txn(desc: &str, amount: f64) -> ExtractedTransaction {
        ExtractedTransaction {
            transaction_date: NaiveDate::from_ymd_opt(2024, 10, 13).unwrap(),
            description: desc.to_string(),
            category: Category::RetailAndGrocery,
            amount,
            account_type: AccountType::CreditCard,
            source_label: "JANE DOE - Credit Card (nov.pdf)".to_string(),
            owner_id: "owner-7".to_string(),
            raw_match: String::new(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let ledger = CsvLedger::open(temp_ledger("missing")).unwrap();
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn test_append_then_reopen() {
        let path = temp_ledger("reopen");
        let mut ledger = CsvLedger::open(&path).unwrap();
        ledger.append(&[txn("Lovisa Alberta AB", 29.39)]).unwrap();
        ledger.append(&[txn("JOHN & ROSS CALG AB", 90.34)]).unwrap();

        let reopened = CsvLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        let date = NaiveDate::from_ymd_opt(2024, 10, 13).unwrap();
        assert!(reopened.find_existing("owner-7", date, "Lovisa Alberta AB", 29.39));
        assert!(!reopened.find_existing("owner-8", date, "Lovisa Alberta AB", 29.39));

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("owner_id")).count(), 1);
        assert!(text.contains("Retail and Grocery"));
        assert!(text.contains("credit_card"));
    }

    #[test]
    fn test_filters_known_records() {
        let path = temp_ledger("filter");
        let mut ledger = CsvLedger::open(&path).unwrap();
        ledger.append(&[txn("Lovisa Alberta AB", 29.39)]).unwrap();

        let (fresh, known) = filter_existing(&ledger, vec![txn("Lovisa Alberta AB", 29.39), txn("SEPHORA.CA", 32.13)]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].description, "SEPHORA.CA");
        assert_eq!(known.len(), 1);
    }
}
