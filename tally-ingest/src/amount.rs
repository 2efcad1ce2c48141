//! Amount tokens and sign normalization.
//!
//! An amount is a whitespace-delimited token with exactly two decimals:
//!   29.39   1,085.99   $138.70   -53.54   (14.45)   - $14.05
//! A leading `-` (attached, or as the preceding standalone token) or an
//! opening parenthesis marks a credit/deposit.

use regex::Regex;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<lp>\()?(?P<neg>-)?\$?(?P<neg2>-)?",
        r"(?P<num>\d{1,3}(?:,\d{3})+\.\d{2}|\d+\.\d{2})",
        r"\)?$"
    ))
    .unwrap()
});

/// A decimal amount found on a line, with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountToken {
    /// Unsigned magnitude
    pub value: f64,
    /// Carried a credit marker (`-` or parenthesis)
    pub negative: bool,
    pub start: usize,
    pub end: usize,
}

impl AmountToken {
    /// Canonical signed amount: marked tokens are inflows (negative).
    pub fn signed(&self) -> f64 {
        if self.negative { -self.value } else { self.value }
    }

    /// Magnitude strictly inside `(min, max)`.
    pub fn in_bounds(&self, min: f64, max: f64) -> bool {
        self.value > min && self.value < max
    }
}

fn parse_token(token: &str) -> Option<(f64, bool)> {
    let caps = AMOUNT_RE.captures(token)?;
    let value: f64 = caps["num"].replace(',', "").parse().ok()?;
    let negative =
        caps.name("lp").is_some() || caps.name("neg").is_some() || caps.name("neg2").is_some();
    Some((value, negative))
}

/// All amount tokens on `line`, left to right.
pub fn find_amounts(line: &str) -> Vec<AmountToken> {
    let mut out = Vec::new();
    let mut dangling_minus: Option<usize> = None;

    for m in TOKEN_RE.find_iter(line) {
        let tok = m.as_str();
        if tok == "-" {
            dangling_minus = Some(m.start());
            continue;
        }
        if let Some((value, negative)) = parse_token(tok) {
            let (start, negative) = match dangling_minus {
                Some(s) => (s, true),
                None => (m.start(), negative),
            };
            out.push(AmountToken { value, negative, start, end: m.end() });
        }
        dangling_minus = None;
    }

    out
}

pub fn has_amount(line: &str) -> bool {
    TOKEN_RE.find_iter(line).any(|m| AMOUNT_RE.is_match(m.as_str()))
}
