use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::PaymentMode;
use crate::error::{Result, TableroError};

/// Overrides the settings file location.
pub const CONFIG_ENV: &str = "TABLERO_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_sales_file")]
    pub sales_file: String,
    #[serde(default = "default_purchases_file")]
    pub purchases_file: String,
    /// Worksheet to read; the first sheet when unset.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub payment_mode: PaymentMode,
}

fn default_sales_file() -> String {
    "KEYPROCESS_REPORTE_VENTA.xlsx".to_string()
}

fn default_purchases_file() -> String {
    "KEYPROCESS_REPORTE_COMPRA.xlsx".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sales_file: default_sales_file(),
            purchases_file: default_purchases_file(),
            sheet: None,
            payment_mode: PaymentMode::default(),
        }
    }
}

/// `$TABLERO_CONFIG` when set, else `~/.config/tablero/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Some(p) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(p);
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("tablero").join("settings.json")
}

/// Saved settings, or the defaults when none are saved. A file that cannot be
/// read or parsed is reported and ignored.
pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    match read_settings(&path) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("ignoring unreadable settings at {}: {e}", path.display());
            Settings::default()
        }
    }
}

fn read_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| TableroError::Settings(e.to_string()))
}

pub fn save_settings(settings: &Settings) -> Result<PathBuf> {
    let path = settings_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| TableroError::Settings(e.to_string()))?;
    std::fs::write(&path, format!("{json}\n"))?;
    Ok(path)
}

/// Absolute form of a report path given on the command line. A leading `~/`
/// is the home directory; paths that do not exist yet are kept as written.
pub fn shellexpand_path(path: &str) -> String {
    let expanded = match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    };
    std::fs::canonicalize(&expanded)
        .unwrap_or(expanded)
        .to_string_lossy()
        .into_owned()
}
