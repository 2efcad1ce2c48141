use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tally_ingest::ExtractOptions;

use crate::state::ensure_tally_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractOptions,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub format: OutputFormat,
    /// CSV ledger of previously recorded transactions
    pub ledger: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

/// Load `path`, or `~/.tally/config.toml` when none is given. A missing
/// default file yields the defaults; a missing explicit file is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = config_path()?;
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn render_config(cfg: &Config) -> Result<String> {
    toml::to_string_pretty(cfg).context("serialize config")
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    fs::write(&p, render_config(&Config::default())?).with_context(|| format!("write {}", p.display()))?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_ingest::YearRollover;

    #[test]
    fn test_partial_config() {
        let cfg = parse_config(
            r#"
[extract]
keep_payments = true
year_rollover = { pinned = 2024 }

[output]
format = "csv"
"#,
        )
        .unwrap();
        assert!(cfg.extract.keep_payments);
        assert_eq!(cfg.extract.year_rollover, YearRollover::Pinned(2024));
        assert_eq!(cfg.extract.max_amount, 50_000.0);
        assert_eq!(cfg.output.format, OutputFormat::Csv);
        assert!(cfg.output.ledger.is_none());
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn test_rendered_defaults_parse_back() {
        let s = render_config(&Config::default()).unwrap();
        assert!(s.contains("[extract]"));
        assert!(s.contains("now-relative"));
        assert_eq!(parse_config(&s).unwrap(), Config::default());
    }

    #[test]
    fn test_bad_format_is_rejected() {
        assert!(parse_config("[output]\nformat = \"xml\"\n").is_err());
    }
}
