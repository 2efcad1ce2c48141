use serde::{Deserialize, Serialize};
use tally_core::AccountType;

use crate::amount::AmountToken;

/// Statement layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// Card charge list: `Trans date | Post date | Description | Category | Amount`
    #[serde(rename = "credit")]
    Credit,
    /// Chequing ledger: `Date | Description | Withdrawals | Deposits | Balance`
    #[serde(rename = "debit")]
    Debit,
}

impl Dialect {
    pub fn account_type(&self) -> AccountType {
        match self {
            Dialect::Credit => AccountType::CreditCard,
            Dialect::Debit => AccountType::Debit,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Credit => f.write_str("credit"),
            Dialect::Debit => f.write_str("debit"),
        }
    }
}

/// Which parsing strategy produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    AmountAnchored,
    CategoryPhrase,
    PipeRow,
    DebitLedger,
}

/// Raw tuple produced by a line parser, before date resolution and
/// categorization.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    /// Short-form date token, e.g. `"Oct 13"`
    pub trans_date: String,
    pub post_date: Option<String>,
    pub description: String,
    pub category_hint: String,
    pub amount: AmountToken,
    pub strategy: StrategyKind,
}

/// Why a line did not become a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Matched a header keyword or column-header token
    Header,
    /// Balance/summary bookkeeping rows
    Noise,
    /// Bill payment ("PAYMENT THANK YOU")
    Payment,
    /// Looked like a transaction but no strategy could parse it
    Unparsed,
    BadDate,
    AmountOutOfRange,
    ShortDescription,
    /// Ledger row with a single amount (FX note, balance only)
    SingleAmount,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::Header => "header",
            SkipReason::Noise => "noise",
            SkipReason::Payment => "payment",
            SkipReason::Unparsed => "unparsed",
            SkipReason::BadDate => "bad date",
            SkipReason::AmountOutOfRange => "amount out of range",
            SkipReason::ShortDescription => "short description",
            SkipReason::SingleAmount => "single amount",
        };
        f.write_str(s)
    }
}

/// Per-line outcome of a dialect parser.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Parsed { line_no: usize, raw: String, parsed: ParsedLine },
    Skipped { line_no: usize, reason: SkipReason },
}
