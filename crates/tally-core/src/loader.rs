//! Transaction file loading, format detection, merging and export
//!
//! The native format is fixed so that parsing is deterministic:
//!
//! - comma separator, one header row
//! - dates as `YYYY-MM-DD`
//! - amounts with `.` as the decimal separator, an optional sign and no
//!   thousands separator
//! - six required columns (any order, case-insensitive, extra columns ignored):
//!   `Date`, `Description` (or `Concept`), `Category`, `Subcategory`,
//!   `Amount`, `Balance`
//!
//! CaixaBank exports are also accepted; see [`FileFormat::Caixabank`].

use std::collections::HashSet;
use std::io::{Read, Write};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Dataset, FileFormat, MergeStats, Transaction};

/// Date format of the native file layout
pub const NATIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date format used by CaixaBank exports
const CAIXABANK_DATE_FORMAT: &str = "%d/%m/%Y";

/// Header written by [`write_csv`]
const NATIVE_HEADER: [&str; 6] = [
    "Date",
    "Description",
    "Category",
    "Subcategory",
    "Amount",
    "Balance",
];

/// Semantic fields and the header labels accepted for each
const FIELD_ALIASES: [(&str, &[&str]); 6] = [
    ("date", &["date", "fecha"]),
    ("description", &["description", "concept", "concepto"]),
    ("category", &["category", "categoria", "categoría"]),
    ("subcategory", &["subcategory", "subcategoria", "subcategoría"]),
    ("amount", &["amount", "importe"]),
    ("balance", &["balance", "saldo"]),
];

/// Column positions of the six required fields
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    description: usize,
    category: usize,
    subcategory: usize,
    amount: usize,
    balance: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();

        let mut found = [None; 6];
        let mut missing = Vec::new();
        for (slot, (field, aliases)) in found.iter_mut().zip(FIELD_ALIASES.iter()) {
            *slot = normalized
                .iter()
                .position(|h| aliases.contains(&h.as_str()));
            if slot.is_none() {
                missing.push(*field);
            }
        }

        match found {
            [Some(date), Some(description), Some(category), Some(subcategory), Some(amount), Some(balance)] => {
                Ok(Self {
                    date,
                    description,
                    category,
                    subcategory,
                    amount,
                    balance,
                })
            }
            _ => Err(Error::MissingColumn(missing.join(", "))),
        }
    }
}

/// Load a native-format transaction file into a validated dataset
///
/// Every row must have as many fields as the header.
pub fn load<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::Empty);
    }
    let columns = ColumnMap::from_headers(&headers)?;

    let mut transactions = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = index + 1;

        if is_blank(&record) {
            continue;
        }

        let cell = |i: usize| record.get(i).unwrap_or("").trim();

        let date_str = cell(columns.date);
        let date = parse_date(date_str, NATIVE_DATE_FORMAT).ok_or_else(|| Error::InvalidDate {
            row,
            value: date_str.to_string(),
        })?;

        let amount_str = cell(columns.amount);
        let amount = parse_amount(amount_str).ok_or_else(|| Error::InvalidAmount {
            row,
            column: "amount",
            value: amount_str.to_string(),
        })?;

        let balance_str = cell(columns.balance);
        let balance = parse_amount(balance_str).ok_or_else(|| Error::InvalidAmount {
            row,
            column: "balance",
            value: balance_str.to_string(),
        })?;

        transactions.push(Transaction {
            id: 0,
            date,
            description: cell(columns.description).to_string(),
            category: cell(columns.category).to_string(),
            subcategory: cell(columns.subcategory).to_string(),
            amount,
            balance,
        });
    }

    debug!("Parsed {} native transactions", transactions.len());
    Dataset::from_transactions(transactions)
}

/// Load a file whose layout is already known
pub fn load_with_format<R: Read>(reader: R, format: FileFormat) -> Result<Dataset> {
    match format {
        FileFormat::Native => load(reader),
        FileFormat::Caixabank => load_caixabank(reader),
    }
}

/// Detect the layout from raw bytes, then load
pub fn load_auto(content: &[u8]) -> Result<Dataset> {
    let format = detect_format(content);
    debug!("Detected {} file format", format);
    load_with_format(content, format)
}

/// Detect the file layout from its raw content
///
/// CaixaBank exports carry their column header on the third line; anything
/// else is treated as the native format.
pub fn detect_format(content: &[u8]) -> FileFormat {
    let text = String::from_utf8_lossy(content);
    let third_line = text.lines().nth(2).unwrap_or("");

    if ["Concepto", "Fecha", "Importe", "Saldo"]
        .iter()
        .all(|label| third_line.contains(label))
    {
        FileFormat::Caixabank
    } else {
        FileFormat::Native
    }
}

/// Parse a CaixaBank export
/// Format: two preamble lines, then `Concepto;Fecha;Importe;Saldo` with
/// `DD/MM/YYYY` dates and balances like `1.234,56EUR`
fn load_caixabank<R: Read>(mut reader: R) -> Result<Dataset> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;

    let body = content.splitn(3, '\n').nth(2).unwrap_or("");

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(b';')
        .from_reader(body.as_bytes());

    let headers = rdr.headers()?.clone();
    let position = |label: &str| headers.iter().position(|h| h.trim() == label);

    let (concept_idx, date_idx, amount_idx, balance_idx) = match (
        position("Concepto"),
        position("Fecha"),
        position("Importe"),
        position("Saldo"),
    ) {
        (Some(c), Some(d), Some(a), Some(b)) => (c, d, a, b),
        _ => {
            return Err(Error::MissingColumn(
                "Concepto, Fecha, Importe, Saldo".to_string(),
            ))
        }
    };

    let mut transactions = Vec::new();
    let mut skipped = 0;

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = index + 1;

        let cell = |i: usize| record.get(i).unwrap_or("").trim();
        let (concept, date_str, amount_str, balance_str) = (
            cell(concept_idx),
            cell(date_idx),
            cell(amount_idx),
            cell(balance_idx),
        );

        // Rows missing any essential field are summary or separator lines
        if concept.is_empty() || date_str.is_empty() || amount_str.is_empty() || balance_str.is_empty() {
            skipped += 1;
            continue;
        }

        let date = parse_date(date_str, CAIXABANK_DATE_FORMAT).ok_or_else(|| Error::InvalidDate {
            row,
            value: date_str.to_string(),
        })?;

        let amount = parse_bank_amount(amount_str).ok_or_else(|| Error::InvalidAmount {
            row,
            column: "amount",
            value: amount_str.to_string(),
        })?;

        let balance = parse_bank_amount(balance_str).ok_or_else(|| Error::InvalidAmount {
            row,
            column: "balance",
            value: balance_str.to_string(),
        })?;

        transactions.push(Transaction {
            id: 0,
            date,
            description: concept.to_string(),
            category: String::new(),
            subcategory: String::new(),
            amount,
            balance,
        });
    }

    if skipped > 0 {
        warn!("Skipped {} incomplete CaixaBank rows", skipped);
    }
    debug!("Parsed {} CaixaBank transactions", transactions.len());
    Dataset::from_transactions(transactions)
}

/// Merge an imported dataset into an existing one, skipping duplicates
///
/// A row is a duplicate when a row with the same date and description
/// already exists in `existing`. Rows within `incoming` are not checked
/// against each other. Existing rows keep their ids; added rows get new
/// ids after them, in `incoming` order.
pub fn merge(existing: &Dataset, incoming: Dataset) -> Result<(Dataset, MergeStats)> {
    let known: HashSet<String> = existing.transactions().iter().map(dedup_key).collect();

    let mut stats = MergeStats::default();
    let mut combined = existing.transactions().to_vec();
    let mut next_id = existing.next_id();

    let mut incoming = incoming.transactions().to_vec();
    incoming.sort_by_key(|tx| tx.id);
    for mut tx in incoming {
        if known.contains(&dedup_key(&tx)) {
            stats.skipped += 1;
        } else {
            stats.added += 1;
            tx.id = next_id;
            next_id += 1;
            combined.push(tx);
        }
    }

    debug!(
        "Merged {} new transactions ({} duplicates skipped)",
        stats.added, stats.skipped
    );
    Ok((Dataset::from_numbered(combined)?, stats))
}

/// Write a dataset in the native format
///
/// Rows are written in id order, so loading the output gives back the same ids.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(NATIVE_HEADER)?;

    let mut rows: Vec<&Transaction> = dataset.transactions().iter().collect();
    rows.sort_by_key(|tx| tx.id);
    for tx in rows {
        wtr.write_record([
            tx.date.format(NATIVE_DATE_FORMAT).to_string(),
            tx.description.clone(),
            tx.category.clone(),
            tx.subcategory.clone(),
            tx.amount.to_string(),
            tx.balance.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Generate the deduplication key for a transaction
pub fn dedup_key(tx: &Transaction) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tx.date.format(NATIVE_DATE_FORMAT).to_string().as_bytes());
    hasher.update(tx.description.as_bytes());
    hex::encode(hasher.finalize())
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn parse_date(s: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), format).ok()
}

/// Parse a native amount: `.` decimals, optional sign, nothing else
fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    let valid = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
    if !valid {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a bank-formatted amount such as `1.234,56EUR` or `-12.5`
fn parse_bank_amount(s: &str) -> Option<f64> {
    let cleaned = s.trim().trim_end_matches("EUR").trim();
    if cleaned.contains(',') {
        parse_amount(&cleaned.replace('.', "").replace(',', "."))
    } else {
        parse_amount(cleaned)
    }
}
