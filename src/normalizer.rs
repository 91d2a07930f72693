use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::{Result, TableroError};
use crate::loader::excel_serial_to_date;
use crate::models::{
    month_name, RawCell, RawTable, Record, Table, AMOUNT_COLUMN, COUNTERPARTY_COLUMN, DATE_COLUMN,
    PAYMENT_METHOD_COLUMN,
};

/// Substituted for a missing payment method.
pub const NOT_INDICATED: &str = "no indica medio";

/// Payment-method spellings folded into one label after lower-casing.
const PAYMENT_SYNONYMS: &[(&str, &str)] = &[("credito", "crédito")];

// Two-digit years must be tried first: `%Y` also accepts a two-digit year.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%Y-%m-%d",
];

/// Earliest year taken as a real transaction date.
const MIN_YEAR: i32 = 1000;

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

/// Accepted source headers for each canonical field, tried in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAliases {
    pub date: Vec<String>,
    pub amount: Vec<String>,
    pub counterparty: Vec<String>,
    pub payment_method: Vec<String>,
}

impl ColumnAliases {
    /// Headers used by the sales and purchases report exports, followed by
    /// the canonical names so exported rows load back unchanged.
    pub fn standard() -> Self {
        Self::from_strs(
            &["FECHA", "FECHA DOCUMENTO"],
            &["TOTAL"],
            &["RAZON SOCIAL"],
            &["FORMA DE PAGO"],
        )
        .or(Self::canonical())
    }

    /// Headers written by [`Table::to_raw`].
    pub fn canonical() -> Self {
        Self::from_strs(
            &[DATE_COLUMN],
            &[AMOUNT_COLUMN],
            &[COUNTERPARTY_COLUMN],
            &[PAYMENT_METHOD_COLUMN],
        )
    }

    /// Append `other`'s aliases after ours.
    pub fn or(mut self, other: Self) -> Self {
        self.date.extend(other.date);
        self.amount.extend(other.amount);
        self.counterparty.extend(other.counterparty);
        self.payment_method.extend(other.payment_method);
        self
    }

    fn from_strs(date: &[&str], amount: &[&str], counterparty: &[&str], payment: &[&str]) -> Self {
        fn owned(v: &[&str]) -> Vec<String> {
            v.iter().map(|s| s.to_string()).collect()
        }
        Self {
            date: owned(date),
            amount: owned(amount),
            counterparty: owned(counterparty),
            payment_method: owned(payment),
        }
    }
}

struct ResolvedColumns {
    date: usize,
    amount: usize,
    counterparty: usize,
    payment_method: Option<usize>,
}

fn find_column(raw: &RawTable, aliases: &[String]) -> Option<usize> {
    aliases.iter().find_map(|a| raw.column_index(a.trim()))
}

fn require_column(raw: &RawTable, aliases: &[String], field: &str) -> Result<usize> {
    find_column(raw, aliases).ok_or_else(|| TableroError::SchemaMismatch {
        field: field.to_string(),
        available: raw.headers.clone(),
    })
}

fn resolve_columns(raw: &RawTable, aliases: &ColumnAliases) -> Result<ResolvedColumns> {
    Ok(ResolvedColumns {
        date: require_column(raw, &aliases.date, "transaction_date")?,
        amount: require_column(raw, &aliases.amount, "amount")?,
        counterparty: require_column(raw, &aliases.counterparty, "counterparty_name")?,
        payment_method: find_column(raw, &aliases.payment_method),
    })
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

/// Parse a day-first date string. ISO dates (year first) are accepted as well.
pub fn parse_date_dmy(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
        .filter(|d| d.year() >= MIN_YEAR)
}

fn parse_date_cell(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Date(d) => Some(*d),
        RawCell::Number(n) => excel_serial_to_date(*n),
        RawCell::Text(s) => parse_date_dmy(s),
        RawCell::Empty => None,
    }
}

/// Parse a monetary amount written as text.
///
/// Accepts `$`, surrounding quotes, parenthesized negatives, and either `.` or
/// `,` as the thousands separator. When both appear the later one is the
/// decimal mark; a lone separator followed by exactly three digits groups
/// thousands, as in `$1.234`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '"' | ' ' | '\u{a0}'))
        .collect();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return parse_amount(inner).map(|d| -d);
    }
    if s.is_empty() {
        return None;
    }

    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');
    let cleaned = match (last_dot, last_comma) {
        (Some(d), Some(c)) if c > d => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (None, Some(c)) => single_separator(&s, ',', c),
        (Some(d), None) => single_separator(&s, '.', d),
        (None, None) => s,
    };
    Decimal::from_str(&cleaned).ok()
}

/// Only one kind of separator present: repeated, or followed by exactly three
/// digits, it groups thousands; otherwise it is the decimal mark.
fn single_separator(s: &str, sep: char, last: usize) -> String {
    let tail = &s[last + sep.len_utf8()..];
    if s.matches(sep).count() == 1 && tail.len() != 3 {
        s.replace(sep, ".")
    } else {
        s.replace(sep, "")
    }
}

fn parse_amount_cell(cell: &RawCell, row: usize) -> Result<Decimal> {
    let invalid = || TableroError::AmountParse {
        row,
        value: cell.to_text(),
    };
    match cell {
        RawCell::Empty => Ok(Decimal::ZERO),
        RawCell::Text(s) if s.trim().is_empty() => Ok(Decimal::ZERO),
        RawCell::Number(n) => Decimal::from_f64(*n).ok_or_else(invalid),
        RawCell::Text(s) => parse_amount(s).ok_or_else(invalid),
        RawCell::Date(_) => Err(invalid()),
    }
}

/// Lower-case, trim and fold synonyms; blank becomes [`NOT_INDICATED`].
pub fn normalize_payment_method(raw: Option<&RawCell>) -> String {
    let text = match raw {
        Some(cell) if !cell.is_blank() => cell.to_text(),
        _ => return NOT_INDICATED.to_string(),
    };
    let label = text.trim().to_lowercase();
    PAYMENT_SYNONYMS
        .iter()
        .find(|(from, _)| *from == label)
        .map(|(_, to)| to.to_string())
        .unwrap_or(label)
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Turn a raw table into a canonical [`Table`] with one record per input row.
///
/// Fails with `SchemaMismatch` when a required field has no matching column
/// and with `DateParse`/`AmountParse` on the first bad cell; no partial table
/// is returned.
pub fn normalize(raw: &RawTable, aliases: &ColumnAliases) -> Result<Table> {
    let cols = resolve_columns(raw, aliases)?;

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut sentinel_count = 0usize;
    let mut blank_amounts = 0usize;
    for row in 0..raw.rows.len() {
        let source_row = raw.source_row(row);
        let date_cell = raw.cell(row, cols.date);
        let transaction_date =
            parse_date_cell(date_cell).ok_or_else(|| TableroError::DateParse {
                row: source_row,
                value: date_cell.to_text(),
            })?;

        let amount_cell = raw.cell(row, cols.amount);
        if amount_cell.is_blank() {
            blank_amounts += 1;
        }
        let amount = parse_amount_cell(amount_cell, source_row)?;

        let counterparty_name = raw.cell(row, cols.counterparty).to_text().trim().to_string();

        let payment_method =
            normalize_payment_method(cols.payment_method.map(|c| raw.cell(row, c)));
        if payment_method == NOT_INDICATED {
            sentinel_count += 1;
        }

        records.push(Record {
            transaction_date,
            amount,
            counterparty_name,
            payment_method,
            year: transaction_date.year(),
            month_name: month_name(transaction_date.month())
                .unwrap_or_default()
                .to_string(),
        });
    }

    if blank_amounts > 0 {
        log::warn!("{blank_amounts} rows have a blank amount; counted as zero");
    }
    log::debug!(
        "normalized {} rows ({} without payment method)",
        records.len(),
        sentinel_count
    );
    Ok(Table::new(records))
}
