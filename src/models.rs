use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical column names written by [`Table::to_raw`].
pub const DATE_COLUMN: &str = "FECHA_TRANSACCION";
pub const AMOUNT_COLUMN: &str = "MONTO";
pub const COUNTERPARTY_COLUMN: &str = "CLIENTE/PROVEEDOR";
pub const PAYMENT_METHOD_COLUMN: &str = "FORMA_DE_PAGO";

pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Month name for a calendar month number (1 = Enero).
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Calendar month number for a month name, ignoring case and surrounding whitespace.
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| m.to_lowercase() == name)
        .map(|i| i as u32 + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sales,
    Purchases,
}

impl Role {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Purchases => "purchases",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Sales => "Ventas",
            Self::Purchases => "Compras",
        }
    }

    /// Plural label for the counterparties of this role ("Clientes" / "Proveedores").
    pub fn counterparty_label(&self) -> &'static str {
        match self {
            Self::Sales => "Clientes",
            Self::Purchases => "Proveedores",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sales" | "ventas" => Ok(Self::Sales),
            "purchases" | "compras" => Ok(Self::Purchases),
            other => Err(format!("unknown role '{other}' (expected sales or purchases)")),
        }
    }
}

/// Calendar month key used for monthly grouping; orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One normalized transaction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub transaction_date: NaiveDate,
    pub amount: Decimal,
    pub counterparty_name: String,
    pub payment_method: String,
    pub year: i32,
    pub month_name: String,
}

impl Record {
    pub fn period(&self) -> YearMonth {
        YearMonth::of(self.transaction_date)
    }
}

/// Canonical table in load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Earliest and latest transaction date, or `None` for an empty table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.transaction_date).min()?;
        let max = self.records.iter().map(|r| r.transaction_date).max()?;
        Some((min, max))
    }

    /// Re-express the table as raw rows under the canonical column names.
    pub fn to_raw(&self) -> RawTable {
        let headers = vec![
            DATE_COLUMN.to_string(),
            AMOUNT_COLUMN.to_string(),
            COUNTERPARTY_COLUMN.to_string(),
            PAYMENT_METHOD_COLUMN.to_string(),
        ];
        let rows = self
            .records
            .iter()
            .map(|r| {
                vec![
                    RawCell::Date(r.transaction_date),
                    RawCell::Text(amount_text(r.amount)),
                    RawCell::Text(r.counterparty_name.clone()),
                    RawCell::Text(r.payment_method.clone()),
                ]
            })
            .collect();
        RawTable {
            headers,
            rows,
            source_rows: Vec::new(),
        }
    }
}

/// Plain decimal text for an amount. Three decimals would read back as a
/// thousands group, so those are written with a fourth zero.
fn amount_text(amount: Decimal) -> String {
    let mut amount = amount;
    if amount.scale() == 3 {
        amount.rescale(4);
    }
    amount.to_string()
}

/// A single spreadsheet cell before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl RawCell {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form used for text fields and error messages.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{n:.0}"),
            Self::Number(n) => n.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

static EMPTY_CELL: RawCell = RawCell::Empty;

/// Header row plus data rows, as read from a source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
    /// 0-based data-row index in the source file of each entry of `rows`.
    /// Empty when no rows were skipped while reading.
    pub source_rows: Vec<usize>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Position of `row` in the source file, counting skipped blank rows.
    pub fn source_row(&self, row: usize) -> usize {
        self.source_rows.get(row).copied().unwrap_or(row)
    }

    /// Cell at `(row, col)`; short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &RawCell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}
