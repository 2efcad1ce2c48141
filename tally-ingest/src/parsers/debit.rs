//! Chequing ledger parser (sequential scan).
//!
//! Expected extracted-text section:
//!   Transaction details
//!   Date     Description                         Withdrawals ($)  Deposits ($)   Balance ($)
//!   Jul 1    Opening balance                                                     $138.70
//!   Jul 2    VISA DEBIT RETAIL PURCHASE          14.82                           123.88
//!            LYFT *TEMP AU  418022828768
//!            VISA DEBIT RETAIL PURCHASE           3.70                           120.18
//!   Jul 3    INT VISA DEB PURCHASE REVERSAL                       14.82          127.60
//!            14.82 CAD @ 1.000000
//!
//! Rows without a date belong to the last dated row. A short row without an
//! amount is merchant detail for the pending transaction; footer prose and
//! page counters are not.

use regex::Regex;
use std::sync::LazyLock;

use crate::amount::find_amounts;
use crate::dates::leading_date;
use crate::text::{is_boundary, is_table_boundary};
use crate::types::{LineOutcome, ParsedLine, SkipReason, StrategyKind};

const SECTION_MARKER: &str = "transaction details";
const BALANCE_ROWS: &[&str] = &["opening balance", "balance forward", "closing balance"];
const MIN_DESCRIPTION_LEN: usize = 5;
const BALANCE_EPSILON: f64 = 0.005;
const MAX_DETAIL_LINES: usize = 1;
const MAX_DETAIL_LEN: usize = 40;

static PAGE_COUNTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^page\s+\d+(?:\s*(?:of|/)\s*\d+)?$").unwrap());

struct Pending {
    line_no: usize,
    raw: String,
    parsed: ParsedLine,
    detail_lines: usize,
}

impl Pending {
    fn add_detail(&mut self, line: &str) {
        if self.detail_lines >= MAX_DETAIL_LINES || !is_detail_line(line) {
            return;
        }
        self.parsed.description.push(' ');
        self.parsed.description.push_str(&collapse(line));
        self.detail_lines += 1;
    }
}

#[derive(Default)]
struct Scan {
    in_section: bool,
    in_table: bool,
    current_date: Option<String>,
    prev_balance: Option<f64>,
    pending: Option<Pending>,
    out: Vec<LineOutcome>,
}

impl Scan {
    fn flush(&mut self) {
        if let Some(p) = self.pending.take() {
            self.out.push(LineOutcome::Parsed { line_no: p.line_no, raw: p.raw, parsed: p.parsed });
        }
    }

    fn skip(&mut self, line_no: usize, reason: SkipReason) {
        self.out.push(LineOutcome::Skipped { line_no, reason });
    }
}

fn is_column_header(lower: &str) -> bool {
    (lower.contains("withdrawals") && (lower.contains("deposits") || lower.contains("balance")))
        || (lower.starts_with("date ") && lower.contains("description"))
}

/// Merchant detail is a short line like `LYFT *TEMP AU  418022828768`.
fn is_detail_line(line: &str) -> bool {
    line.chars().count() <= MAX_DETAIL_LEN && !line.contains(':') && !PAGE_COUNTER_RE.is_match(line)
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct DebitParser;

impl DebitParser {
    pub fn parse(&self, text: &str) -> Vec<LineOutcome> {
        let mut scan = Scan::default();

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            // Derived tables repeat the page text; a page marker ends them.
            if is_boundary(line) {
                scan.flush();
                scan.in_table = is_table_boundary(line);
                continue;
            }
            if scan.in_table {
                continue;
            }

            let lower = line.to_lowercase();
            if !scan.in_section {
                scan.in_section = lower.contains(SECTION_MARKER);
                continue;
            }
            if is_column_header(&lower) {
                continue;
            }

            let (date_end, dated) = match leading_date(line) {
                Some((token, end)) => {
                    scan.current_date = Some(token.to_string());
                    (end, true)
                }
                None => (0, false),
            };

            let amounts = find_amounts(line);

            if BALANCE_ROWS.iter().any(|b| lower.contains(b)) {
                scan.flush();
                if let Some(last) = amounts.last() {
                    scan.prev_balance = Some(last.signed());
                }
                scan.skip(line_no, SkipReason::Noise);
                continue;
            }
            if lower.contains("service charge") {
                scan.flush();
                if amounts.len() >= 2 {
                    scan.prev_balance = amounts.last().map(|a| a.signed());
                }
                scan.skip(line_no, SkipReason::Noise);
                continue;
            }

            match amounts.len() {
                0 => {
                    if dated {
                        scan.flush();
                    } else if let Some(p) = scan.pending.as_mut() {
                        p.add_detail(line);
                    }
                }
                1 => {
                    scan.flush();
                    scan.skip(line_no, SkipReason::SingleAmount);
                }
                _ => {
                    scan.flush();
                    let Some(date) = scan.current_date.clone() else {
                        scan.skip(line_no, SkipReason::BadDate);
                        continue;
                    };

                    let balance = amounts[amounts.len() - 1].signed();
                    let mut amount = amounts[0].clone();
                    let description = collapse(line.get(date_end..amount.start).unwrap_or_default());

                    if description.chars().count() < MIN_DESCRIPTION_LEN {
                        scan.skip(line_no, SkipReason::ShortDescription);
                        continue;
                    }

                    let deposit = scan
                        .prev_balance
                        .is_some_and(|prev| ((prev + amount.value) - balance).abs() < BALANCE_EPSILON);
                    if deposit {
                        amount.negative = true;
                    }
                    scan.prev_balance = Some(balance);

                    log::trace!("ledger row {line_no}: {date} {description} {}", amount.signed());
                    scan.pending = Some(Pending {
                        line_no,
                        raw: line.to_string(),
                        parsed: ParsedLine {
                            trans_date: date,
                            post_date: None,
                            description,
                            category_hint: String::new(),
                            amount,
                            strategy: StrategyKind::DebitLedger,
                        },
                        detail_lines: 0,
                    });
                }
            }
        }

        scan.flush();
        scan.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: &str = "\
CIBC Account Statement
Account summary
Opening balance on Jul 1, 2024                    $138.70
Transaction details
Date     Description                              Withdrawals ($)  Deposits ($)   Balance ($)
Jul 1    Opening balance                                                            $138.70
Jul 2    VISA DEBIT RETAIL PURCHASE                      14.82                           123.88
         LYFT *TEMP AU  418022828768
         VISA DEBIT RETAIL PURCHASE                       3.70                           120.18
         CALGARY TRANSIT  418177070165
Jul 3    INT VISA DEB PURCHASE REVERSAL                                  14.82           134.99
         LYFT *TEMP AU  418022828768
         14.82 CAD @ 1.000000
Jul 26   E-TRANSFER      011058991047                                     400.00          534.99
         OLUWADARA OLAIFA
";

    fn parsed(outcomes: &[LineOutcome]) -> Vec<&ParsedLine> {
        outcomes
            .iter()
            .filter_map(|o| match o {
                LineOutcome::Parsed { parsed, .. } => Some(parsed),
                _ => None,
            })
            .collect()
    }

    fn skips(outcomes: &[LineOutcome]) -> Vec<SkipReason> {
        outcomes
            .iter()
            .filter_map(|o| match o {
                LineOutcome::Skipped { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_ledger_rows_and_continuations() {
        let out = DebitParser.parse(LEDGER);
        let rows = parsed(&out);
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].trans_date, "Jul 2");
        assert_eq!(rows[0].description, "VISA DEBIT RETAIL PURCHASE LYFT *TEMP AU 418022828768");
        assert_eq!(rows[0].amount.signed(), 14.82);
        assert_eq!(rows[0].strategy, StrategyKind::DebitLedger);

        // undated row carries the previous date forward
        assert_eq!(rows[1].trans_date, "Jul 2");
        assert_eq!(rows[1].amount.signed(), 3.70);
        assert_eq!(rows[1].description, "VISA DEBIT RETAIL PURCHASE CALGARY TRANSIT 418177070165");
    }

    #[test]
    fn test_deposit_polarity_from_running_balance() {
        let out = DebitParser.parse(LEDGER);
        let rows = parsed(&out);
        // 120.18 + 14.82 = 135.00 != 134.99, so the reversal keeps its sign
        assert_eq!(rows[2].amount.signed(), 14.82);
        // 134.99 + 400.00 = 534.99
        assert_eq!(rows[3].amount.signed(), -400.00);
        assert_eq!(rows[3].description, "E-TRANSFER 011058991047 OLUWADARA OLAIFA");
    }

    #[test]
    fn test_balance_and_fx_rows_are_skipped() {
        let out = DebitParser.parse(LEDGER);
        let reasons = skips(&out);
        assert_eq!(reasons, vec![SkipReason::Noise, SkipReason::SingleAmount]);
    }

    #[test]
    fn test_explicit_marker_wins() {
        let text = "Transaction details\nJul 1 Opening balance 100.00\nJul 5 REFUND FROM STORE (20.00) 80.00\n";
        let rows = DebitParser.parse(text);
        assert_eq!(parsed(&rows)[0].amount.signed(), -20.00);
    }

    #[test]
    fn test_nothing_before_section_marker() {
        let text = "Jul 2 VISA DEBIT RETAIL PURCHASE 14.82 123.88\n";
        assert!(DebitParser.parse(text).is_empty());
    }

    #[test]
    fn test_short_description_and_service_charge() {
        let text = "Transaction details\nJul 2 ABC 1.00 2.00\nJul 3 Service charge 4.95 118.93\nJul 4 GROCERY OUTLET 10.00 108.93\n";
        let out = DebitParser.parse(text);
        assert_eq!(skips(&out), vec![SkipReason::ShortDescription, SkipReason::Noise]);
        let rows = parsed(&out);
        assert_eq!(rows.len(), 1);
        // 118.93 - 10.00 = 108.93
        assert_eq!(rows[0].amount.signed(), 10.00);
    }

    #[test]
    fn test_table_segments_are_ignored() {
        let text = "\
=== PAGE 1 ===
Transaction details
Jul 2    VISA DEBIT RETAIL PURCHASE    14.82    123.88
=== TABLE 1 (page 1) ===
Jul 2 | VISA DEBIT RETAIL PURCHASE | 14.82 | 123.88
Jul 2 | VISA DEBIT RETAIL PURCHASE | 3.70 | 120.18
=== PAGE 2 ===
Jul 9    E-TRANSFER 011058991047    55.00    65.18
";
        let rows_out = DebitParser.parse(text);
        let rows = parsed(&rows_out);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].trans_date, "Jul 9");
    }

    #[test]
    fn test_footer_text_is_not_merchant_detail() {
        let text = "\
Transaction details
Jul 1    Opening balance                                  134.99
Jul 26   E-TRANSFER      011058991047         400.00      534.99
         OLUWADARA OLAIFA
Important: This statement will be considered correct unless you notify us within 30 days
Page 1 of 2
";
        let out = DebitParser.parse(text);
        let rows = parsed(&out);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "E-TRANSFER 011058991047 OLUWADARA OLAIFA");
        assert_eq!(rows[0].amount.signed(), -400.00);
    }

    #[test]
    fn test_one_detail_line_per_row() {
        let text = "\
Transaction details
Jul 2    VISA DEBIT RETAIL PURCHASE     14.82     123.88
         LYFT *TEMP AU  418022828768
         Foreign currency transactions
";
        let out = DebitParser.parse(text);
        assert_eq!(parsed(&out)[0].description, "VISA DEBIT RETAIL PURCHASE LYFT *TEMP AU 418022828768");
        assert!(is_detail_line("CALGARY TRANSIT  418177070165"));
        assert!(!is_detail_line("Page 2 of 3"));
        assert!(!is_detail_line("page 4"));
        assert!(!is_detail_line("Account number: 12345"));
    }

    #[test]
    fn test_balance_forward_sets_running_balance() {
        let text = "\
Transaction details
Jul 1    Balance forward                                  200.00
Jul 3    PAYROLL DEPOSIT ACME CORP             1,000.00   1,200.00
Jul 4    E-TRANSFER 011058991047                  50.00   1,150.00
";
        let out = DebitParser.parse(text);
        assert_eq!(skips(&out), vec![SkipReason::Noise]);
        let rows = parsed(&out);
        assert_eq!(rows.len(), 2);
        // 200.00 + 1,000.00 = 1,200.00
        assert_eq!(rows[0].amount.signed(), -1000.00);
        assert_eq!(rows[0].trans_date, "Jul 3");
        assert_eq!(rows[1].amount.signed(), 50.00);
    }

    #[test]
    fn test_undated_row_before_any_date() {
        let text = "Transaction details\n  PREAUTHORIZED DEBIT 25.00 75.00\n";
        assert_eq!(skips(&DebitParser.parse(text)), vec![SkipReason::BadDate]);
    }
}
