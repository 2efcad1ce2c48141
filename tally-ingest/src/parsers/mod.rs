//! Dialect-specific line parsers.

pub mod credit;
pub mod debit;

pub use credit::{CreditParser, CreditStrategy, split_category};
pub use debit::DebitParser;

use crate::pipeline::ExtractOptions;
use crate::types::{Dialect, LineOutcome};

/// Run the parser for `dialect` over the whole text blob.
pub fn parse_lines(dialect: Dialect, text: &str, options: &ExtractOptions) -> Vec<LineOutcome> {
    match dialect {
        Dialect::Credit => CreditParser::new(options.min_line_len, options.keep_payments).parse(text),
        Dialect::Debit => DebitParser.parse(text),
    }
}
