use std::path::Path;

use chrono::NaiveDate;

use crate::error::{Result, TableroError};
use crate::models::{RawCell, RawTable};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serial of 9999-12-31, the last date Excel represents.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Convert an Excel serial day number to a calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    chrono::Duration::try_days(serial.trunc() as i64).and_then(|d| base.checked_add_signed(d))
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn is_spreadsheet(ext: &str) -> bool {
    matches!(ext, "xlsx" | "xlsm" | "xlsb" | "xls" | "ods")
}

/// Pick `;` over `,` when the header line uses it more often.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

// ---------------------------------------------------------------------------
// load_raw
// ---------------------------------------------------------------------------

/// Read a source file into a header row plus data rows.
///
/// Spreadsheets are read from `sheet` when given, else from the first sheet.
/// Rows whose cells are all blank are dropped.
pub fn load_raw(path: &Path, sheet: Option<&str>) -> Result<RawTable> {
    let ext = extension(path);
    let raw = if ext == "csv" || ext == "txt" {
        read_csv(path)?
    } else if is_spreadsheet(&ext) {
        read_workbook(path, sheet)?
    } else {
        return Err(TableroError::UnsupportedFile(path.display().to_string()));
    };
    log::debug!(
        "loaded {} ({} columns, {} rows)",
        path.display(),
        raw.headers.len(),
        raw.rows.len()
    );
    Ok(raw)
}

fn read_csv(path: &Path) -> Result<RawTable> {
    let bytes = std::fs::read(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(sniff_delimiter(&bytes))
        .trim(csv::Trim::Headers)
        .from_reader(bytes.as_slice());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    let mut source_rows = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row: Vec<RawCell> = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    RawCell::Empty
                } else {
                    RawCell::Text(field.to_string())
                }
            })
            .collect();
        if row.iter().all(RawCell::is_blank) {
            continue;
        }
        rows.push(row);
        source_rows.push(index);
    }
    Ok(RawTable {
        headers,
        rows,
        source_rows,
    })
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook(path: &Path, _sheet: Option<&str>) -> Result<RawTable> {
    Err(TableroError::UnsupportedFile(format!(
        "{} (spreadsheet support requires the 'xlsx' feature)",
        path.display()
    )))
}

#[cfg(feature = "xlsx")]
fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<RawTable> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| TableroError::Workbook(format!("Failed to open {}: {e}", path.display())))?;

    let sheet_names = workbook.sheet_names();
    let name = match sheet {
        Some(s) => s.to_string(),
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| TableroError::Workbook(format!("{} has no sheets", path.display())))?,
    };
    if sheet.is_none() && sheet_names.len() > 1 {
        log::warn!(
            "{} has {} sheets; reading '{name}' only",
            path.display(),
            sheet_names.len()
        );
    }

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| TableroError::Workbook(format!("Failed to read sheet '{name}': {e}")))?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header) => header
            .iter()
            .map(|c| cell_from_data(c).to_text().trim().to_string())
            .collect(),
        None => Vec::new(),
    };
    let mut rows = Vec::new();
    let mut source_rows = Vec::new();
    for (index, row) in rows_iter.enumerate() {
        let cells: Vec<RawCell> = row.iter().map(cell_from_data).collect();
        if cells.iter().all(RawCell::is_blank) {
            continue;
        }
        rows.push(cells);
        source_rows.push(index);
    }
    Ok(RawTable {
        headers,
        rows,
        source_rows,
    })
}

#[cfg(feature = "xlsx")]
pub fn cell_from_data(data: &calamine::Data) -> RawCell {
    use calamine::Data;
    match data {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
            Some(d) => RawCell::Date(d),
            None => RawCell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::Error(e) => RawCell::Text(format!("{e:?}")),
    }
}
