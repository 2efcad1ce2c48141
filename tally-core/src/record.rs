//! Normalized transaction records and per-statement metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Which kind of account a statement belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountType {
    #[serde(rename = "credit_card")]
    CreditCard,
    #[serde(rename = "debit")]
    Debit,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::CreditCard => "credit_card",
            AccountType::Debit => "debit",
        }
    }

    /// Human-readable name used in source labels
    pub fn display_name(&self) -> &'static str {
        match self {
            AccountType::CreditCard => "Credit Card",
            AccountType::Debit => "Debit",
        }
    }

    pub fn parse(s: &str) -> Option<AccountType> {
        match s.trim() {
            "credit_card" => Some(AccountType::CreditCard),
            "debit" => Some(AccountType::Debit),
            _ => None,
        }
    }
}

/// A transaction extracted from one statement line.
///
/// Sign convention: positive = outflow (charge or withdrawal),
/// negative = inflow (payment credit, refund or deposit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    pub transaction_date: NaiveDate,
    pub description: String,
    pub category: Category,
    pub amount: f64,
    pub account_type: AccountType,
    /// Provenance: holder name + account type + optional filename
    pub source_label: String,
    /// Opaque caller identifier, never interpreted here
    pub owner_id: String,
    /// The statement line this record came from
    pub raw_match: String,
}

impl ExtractedTransaction {
    pub fn is_outflow(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_inflow(&self) -> bool {
        self.amount < 0.0
    }

    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }

    /// Amount in whole cents, for exact comparisons.
    pub fn amount_cents(&self) -> i64 {
        to_cents(self.amount)
    }
}

/// Round a currency amount to integer cents.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Header facts derived once per document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementMetadata {
    pub holder_name: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub statement_year: Option<i32>,
}

impl StatementMetadata {
    pub fn holder_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.holder_name.as_deref().unwrap_or(fallback)
    }
}

/// Build the provenance label attached to every record of a statement.
///
/// `"JANE DOE - Credit Card (october.pdf)"`; the filename part is omitted when
/// no filename is known.
pub fn source_label(holder: &str, account_type: AccountType, filename: Option<&str>) -> String {
    let holder = holder.trim();
    let holder = if holder.is_empty() { "Unknown" } else { holder };
    match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => format!("{} - {} ({})", holder, account_type.display_name(), f),
        None => format!("{} - {}", holder, account_type.display_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(amount: f64) -> ExtractedTransaction {
        ExtractedTransaction {
            transaction_date: NaiveDate::from_ymd_opt(2024, 10, 13).unwrap(),
            description: "Lovisa Alberta AB".to_string(),
            category: Category::RetailAndGrocery,
            amount,
            account_type: AccountType::CreditCard,
            source_label: "JANE DOE - Credit Card".to_string(),
            owner_id: "u-1".to_string(),
            raw_match: "Oct 13 Oct 15 Lovisa Alberta AB Retail and Grocery 29.39".to_string(),
        }
    }

    #[test]
    fn test_polarity_helpers() {
        assert!(sample(29.39).is_outflow());
        assert!(sample(-100.0).is_inflow());
        assert_eq!(sample(-100.0).abs_amount(), 100.0);
        assert_eq!(sample(29.39).amount_cents(), 2939);
    }

    #[test]
    fn test_source_label_variants() {
        assert_eq!(
            source_label("JANE DOE", AccountType::Debit, Some("july.pdf")),
            "JANE DOE - Debit (july.pdf)"
        );
        assert_eq!(
            source_label("", AccountType::CreditCard, Some("  ")),
            "Unknown - Credit Card"
        );
    }

    #[test]
    fn test_account_type_serde() {
        let json = serde_json::to_string(&AccountType::CreditCard).unwrap();
        assert_eq!(json, "\"credit_card\"");
        assert_eq!(AccountType::parse("debit"), Some(AccountType::Debit));
        assert_eq!(AccountType::parse("savings"), None);
    }

    #[test]
    fn test_record_json_shape() {
        let v = serde_json::to_value(sample(29.39)).unwrap();
        assert_eq!(v["transaction_date"], "2024-10-13");
        assert_eq!(v["category"], "Retail and Grocery");
        assert_eq!(v["account_type"], "credit_card");
    }
}
