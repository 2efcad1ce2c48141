//! Header/noise and payment line recognition.

use regex::Regex;
use std::sync::LazyLock;

/// Card chrome that marks a line as statement furniture wherever it appears.
/// Matched on word boundaries so merchant names merely containing a keyword
/// survive ("LOVISA" is not "VISA").
pub const CHROME_KEYWORDS: &[&str] = &["VISA", "CARD NUMBER", "ACCOUNT NUMBER"];

/// Account summary rows. These only count when they lead the line, so a
/// charge at "TOTAL WINE" or "NEW BALANCE" stays a transaction.
pub const SUMMARY_KEYWORDS: &[&str] = &[
    "PREVIOUS BALANCE",
    "NEW BALANCE",
    "TOTAL",
    "MINIMUM PAYMENT",
    "CREDIT LIMIT",
    "AVAILABLE CREDIT",
    "STATEMENT DATE",
    "PAYMENT DUE",
    "ANNUAL INTEREST",
];

/// Column headings that appear alone on a line.
pub const COLUMN_HEADERS: &[&str] = &["TRANS", "POST", "DESCRIPTION", "AMOUNT", "SPEND CATEGORIES"];

/// Bill payments; these are not spend or refund events.
pub const PAYMENT_PHRASES: &[&str] = &[
    "PAYMENT THANK YOU",
    "PAIEMENT MERCI",
    "PAYMENT - THANK YOU",
    "THANK YOU FOR YOUR PAYMENT",
    "PAYMENT RECEIVED",
];

fn keyword_alternation(keywords: &[&str]) -> String {
    keywords
        .iter()
        .map(|k| regex::escape(k).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}

static CHROME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b(?:{})\b", keyword_alternation(CHROME_KEYWORDS))).unwrap());

static SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)^(?:{})\b", keyword_alternation(SUMMARY_KEYWORDS))).unwrap());

/// Chrome keyword anywhere, or a summary keyword leading the line.
pub fn is_header_line(line: &str) -> bool {
    let trimmed = line.trim();
    CHROME_RE.is_match(trimmed) || SUMMARY_RE.is_match(trimmed)
}

/// A line holding nothing but a column heading, e.g. `Spend Categories`.
pub fn is_column_header(line: &str) -> bool {
    let trimmed = line.trim();
    COLUMN_HEADERS.iter().any(|h| trimmed.eq_ignore_ascii_case(h))
}

/// Contains one of the payment/"thank you" phrases (case-insensitive).
pub fn is_payment_text(text: &str) -> bool {
    let upper = text.to_uppercase();
    PAYMENT_PHRASES.iter().any(|p| upper.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_keywords_are_not_headers() {
        for line in [
            "Oct 13 Oct 15 LOVISA ALBERTA AB Retail and Grocery 29.39",
            "Oct 13 Oct 15 ADVISATECH SOLUTIONS Professional and Financial Services 19.00",
            "Oct 13 Oct 15 REVISAGE SALON Personal and Household Expenses 45.00",
            "Oct 13 Oct 15 TOTALENERGIES STATION Transportation 61.20",
        ] {
            assert!(!is_header_line(line), "misclassified: {line}");
        }
    }

    #[test]
    fn test_real_headers() {
        assert!(is_header_line("CIBC Dividend VISA Card statement"));
        assert!(is_header_line("Total for 4500 XXXX XXXX 8519   1,234.56"));
        assert!(is_header_line("Previous   balance  $1,085.99"));
        assert!(is_header_line("NEW BALANCE Nov 15 $1,234.56"));
        assert!(is_header_line("Card number 4500 XXXX XXXX 8519"));
    }

    #[test]
    fn test_summary_keywords_inside_merchant_names() {
        for line in [
            "Oct 13 Oct 15 NEW BALANCE CALGARY AB Retail and Grocery 120.00",
            "Oct 14 Oct 15 TOTAL WINE AND MORE Retail and Grocery 45.10",
            "Oct 16 Oct 17 STATEMENT DATE NIGHT BISTRO Restaurants 38.00",
        ] {
            assert!(!is_header_line(line), "misclassified: {line}");
        }
    }

    #[test]
    fn test_column_headers() {
        assert!(is_column_header("  spend categories "));
        assert!(is_column_header("Trans"));
        assert!(!is_column_header("Spend categories overview for Oct 2024"));
        assert!(!is_header_line("  spend categories "));
    }

    #[test]
    fn test_payment_phrases() {
        assert!(is_payment_text("PAYMENT THANK YOU/PAIEMENT MERCI"));
        assert!(is_payment_text("VISA Payment Thank You"));
        assert!(is_payment_text("payment received - online banking"));
        assert!(!is_payment_text("PAYMENT PROCESSING FEE"));
    }
}
