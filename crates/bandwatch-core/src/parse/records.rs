use csv::{ReaderBuilder, StringRecord};

use super::Diagnostic;
use crate::{parse_date, PriceRecord, PRICE_COLUMNS};

/// Price rows in file order plus the rows that needed tolerance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecords {
    pub records: Vec<PriceRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses the fetch artifact: a header line, then one comma-separated row of
/// `Datetime, Open, High, Low, Close, AdjClose, Volume` per sample.
///
/// Blank rows are dropped. Every other row yields exactly one record, with
/// fields assigned by position and carried as raw text. Quotes have no special
/// meaning: a field is everything between two commas on one line.
pub fn parse_price_records(text: &str) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    for result in reader.records() {
        match result {
            Ok(row) => {
                if is_blank(&row) {
                    continue;
                }
                let line = row.position().map_or(0, |position| position.line());
                inspect_row(line, &row, &mut parsed.diagnostics);
                parsed.records.push(PriceRecord::from_fields(row.iter()));
            }
            Err(error) => {
                let line = error.position().map_or(0, |position| position.line());
                parsed.diagnostics.push(Diagnostic::Unreadable {
                    line,
                    message: error.to_string(),
                });
            }
        }
    }

    parsed
}

fn is_blank(row: &StringRecord) -> bool {
    row.len() == 1 && row.get(0).is_some_and(|field| field.trim().is_empty())
}

fn inspect_row(line: u64, row: &StringRecord, diagnostics: &mut Vec<Diagnostic>) {
    let found = row.len();
    if found < PRICE_COLUMNS.len() {
        diagnostics.push(Diagnostic::MissingFields { line, found });
    } else if found > PRICE_COLUMNS.len() {
        diagnostics.push(Diagnostic::ExtraFields { line, found });
    }

    if let Some(value) = row.get(0) {
        if !is_timestamp(value) {
            diagnostics.push(Diagnostic::BadTimestamp {
                line,
                value: value.to_owned(),
            });
        }
    }

    for (&column, value) in PRICE_COLUMNS.iter().zip(row.iter()).skip(1) {
        if value.trim().parse::<f64>().is_err() {
            diagnostics.push(Diagnostic::NonNumeric {
                line,
                column,
                value: value.to_owned(),
            });
        }
    }
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part (`T` or space).
fn is_timestamp(value: &str) -> bool {
    let value = value.trim();
    let Some(date) = value.get(..10) else {
        return false;
    };
    if parse_date(date).is_err() {
        return false;
    }
    match value.as_bytes().get(10) {
        None => true,
        Some(b'T' | b' ') => value.len() > 11,
        Some(_) => false,
    }
}
