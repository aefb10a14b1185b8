//! Transaction-level reader for SIE type 4 ledger exports
//!
//! Extracts full voucher detail from the line-oriented interchange format:
//! every `#VER` block with its individual `#TRANS` lines (account, signed
//! amount, optional date and description). Malformed lines are skipped with
//! a warning — the reader always produces whatever vouchers it can.

use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use regex::Regex;
use tracing::{info, warn};

use crate::types::{ReconResult, Transaction, Voucher};

// #VER <series> <number> <yyyymmdd> <description> [{]
// Descriptions may be quoted or bare; an opening brace on the same line is
// not part of the description.
static VER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^#VER\s+([A-Za-z0-9]+)\s+(\S+)\s+(\d{8})\s+(.*?)(?:\s*\{)?$"#)
        .expect("valid pattern")
});

// #TRANS <account> {<object list>} <amount> [<yyyymmdd>] [<description>]
static TRANS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^#TRANS\s+(\d+)\s+\{.*?\}\s+(-?\d+\.?\d*)\s*(\d{8})?\s*(?:"?(.*?)"?)?$"#)
        .expect("valid pattern")
});

/// Read and parse a SIE file.
///
/// The bytes are decoded as UTF-8 when possible, falling back to
/// Windows-1252 for legacy exports (the byte-complete superset decode also
/// tolerates the old PC8/OEM codepages; the structural keywords are ASCII
/// either way).
pub fn parse_file(path: impl AsRef<Path>) -> ReconResult<Vec<Voucher>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;

    let content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let bytes = err.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    let vouchers = parse_str(&content);
    info!(
        file = %path.display(),
        vouchers = vouchers.len(),
        balanced = vouchers.iter().filter(|v| v.is_balanced()).count(),
        "parsed SIE file"
    );
    Ok(vouchers)
}

/// Parse SIE content that is already decoded text.
///
/// A small state machine walks the `#VER` / `{` / `#TRANS` / `}` structure.
/// A voucher is kept only when its block closed with at least one
/// transaction line.
pub fn parse_str(content: &str) -> Vec<Voucher> {
    let mut vouchers = Vec::new();
    let mut current: Option<Voucher> = None;
    let mut in_block = false;

    let lines: Vec<&str> = content.lines().collect();
    for (i, raw_line) in lines.iter().enumerate() {
        let mut line = raw_line.trim().to_string();

        if line.starts_with("#VER") {
            // Descriptions occasionally wrap; join the continuation line.
            if !line.ends_with('"') && i + 1 < lines.len() {
                line.push_str(lines[i + 1].trim());
            }
            current = parse_ver_line(&line);
        } else if line.starts_with('{') && current.is_some() {
            in_block = true;
        } else if line.starts_with('}') && in_block {
            if let Some(voucher) = current.take() {
                if !voucher.transactions.is_empty() {
                    vouchers.push(voucher);
                }
            }
            in_block = false;
        } else if in_block && line.starts_with("#TRANS") {
            if let Some(voucher) = current.as_mut() {
                if let Some(transaction) = parse_trans_line(&line) {
                    voucher.add_transaction(transaction);
                }
            }
        }
    }

    if vouchers.is_empty() {
        warn!("no vouchers found in SIE content");
    }

    vouchers
}

fn parse_ver_line(line: &str) -> Option<Voucher> {
    let Some(caps) = VER_PATTERN.captures(line) else {
        warn!(%line, "could not parse #VER line");
        return None;
    };

    let number_text = caps[2].trim_matches('"');
    let number = if number_text.is_empty() {
        0
    } else {
        match number_text.parse() {
            Ok(number) => number,
            Err(_) => {
                warn!(%line, "invalid voucher number in #VER line");
                return None;
            }
        }
    };

    let Ok(date) = NaiveDate::parse_from_str(&caps[3], "%Y%m%d") else {
        warn!(%line, "invalid date in #VER line");
        return None;
    };

    Some(Voucher::new(
        &caps[1],
        number,
        date,
        caps[4].trim_matches('"'),
    ))
}

fn parse_trans_line(line: &str) -> Option<Transaction> {
    let Some(caps) = TRANS_PATTERN.captures(line) else {
        warn!(%line, "could not parse #TRANS line");
        return None;
    };

    let Ok(amount) = BigDecimal::from_str(caps[2].trim_end_matches('.')) else {
        warn!(%line, "invalid amount in #TRANS line");
        return None;
    };

    let date = caps
        .get(3)
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y%m%d").ok());

    let description = caps
        .get(4)
        .map(|m| m.as_str().trim_matches('"'))
        .unwrap_or_default();

    Some(Transaction {
        account: caps[1].to_string(),
        amount,
        date,
        description: description.to_string(),
    })
}
