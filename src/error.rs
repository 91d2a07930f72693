use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableroError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("No column found for required field '{field}' (headers: {})", available.join(", "))]
    SchemaMismatch { field: String, available: Vec<String> },

    #[error("Unparsable date '{value}' at row {row}")]
    DateParse { row: usize, value: String },

    #[error("Unparsable amount '{value}' at row {row}")]
    AmountParse { row: usize, value: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, TableroError>;
