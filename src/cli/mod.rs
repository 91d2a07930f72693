pub mod dashboard;
pub mod init;
pub mod options;
pub mod report;
pub mod text;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::aggregate::PaymentMode;
use crate::cache::TableCache;
use crate::dashboard::{Dashboard, Sources};
use crate::error::{Result, TableroError};
use crate::filters::{DateRange, FilterSpec};
use crate::models::Role;
use crate::normalizer::parse_date_dmy;
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "tablero",
    version,
    about = "Sales and purchases dashboard over spreadsheet exports."
)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Sales report (XLSX, XLS, ODS or CSV)
    #[arg(long, global = true)]
    pub sales: Option<String>,
    /// Purchases report (XLSX, XLS, ODS or CSV)
    #[arg(long, global = true)]
    pub purchases: Option<String>,
    /// Worksheet name (default: first sheet)
    #[arg(long, global = true)]
    pub sheet: Option<String>,
}

impl SourceArgs {
    /// Command-line paths win over the saved settings.
    pub fn resolve(&self, settings: &Settings) -> Sources {
        Sources {
            sales: PathBuf::from(self.sales.as_deref().unwrap_or(&settings.sales_file)),
            purchases: PathBuf::from(
                self.purchases
                    .as_deref()
                    .unwrap_or(&settings.purchases_file),
            ),
            sheet: self.sheet.clone().or_else(|| settings.sheet.clone()),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save the report locations (from --sales/--purchases) as defaults.
    Init {
        /// Default payment distribution: count or amount
        #[arg(long = "payment-mode")]
        payment_mode: Option<PaymentMode>,
    },
    /// List the filter values available in the loaded data.
    Options {
        #[arg(long)]
        json: bool,
    },
    /// Show sales and purchases side by side.
    Dashboard {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Show a single chart's data for one table.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Top 10 counterparties by amount.
    Top(ReportArgs),
    /// Monthly totals with running total.
    Monthly(ReportArgs),
    /// Distribution by payment method.
    Payments(ReportArgs),
    /// Filtered transactions.
    Rows(ReportArgs),
}

impl ReportCommands {
    pub fn args(&self) -> &ReportArgs {
        match self {
            Self::Top(a) | Self::Monthly(a) | Self::Payments(a) | Self::Rows(a) => a,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Table to report on: sales or purchases
    #[arg(long, default_value = "sales")]
    pub role: Role,
    #[command(flatten)]
    pub filters: FilterArgs,
    #[arg(long)]
    pub json: bool,
    /// Write the filtered rows as CSV under canonical headers (rows only)
    #[arg(long, conflicts_with = "json")]
    pub csv: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Start date: DD/MM/YYYY or YYYY-MM-DD (default: first sales date)
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date: DD/MM/YYYY or YYYY-MM-DD (default: last sales date)
    #[arg(long = "to")]
    pub to_date: Option<String>,
    /// Year filter, repeatable
    #[arg(long = "year")]
    pub years: Vec<i32>,
    /// Month name filter (Enero..Diciembre), repeatable
    #[arg(long = "month")]
    pub months: Vec<String>,
    /// Payment method filter, repeatable
    #[arg(long = "payment")]
    pub payment_methods: Vec<String>,
    /// Client filter (sales only), repeatable
    #[arg(long = "client")]
    pub clients: Vec<String>,
    /// Supplier filter (purchases only), repeatable
    #[arg(long = "supplier")]
    pub suppliers: Vec<String>,
    /// Payment distribution: count or amount
    #[arg(long = "payment-mode")]
    pub payment_mode: Option<PaymentMode>,
}

fn parse_date_arg(flag: &str, value: &Option<String>) -> Result<Option<chrono::NaiveDate>> {
    match value {
        Some(v) => parse_date_dmy(v)
            .map(Some)
            .ok_or_else(|| TableroError::InvalidFilter(format!("{flag}: unparsable date '{v}'"))),
        None => Ok(None),
    }
}

impl FilterArgs {
    pub fn to_spec(&self, default_mode: PaymentMode) -> Result<FilterSpec> {
        let range = DateRange::new(
            parse_date_arg("--from", &self.from_date)?,
            parse_date_arg("--to", &self.to_date)?,
        )?;
        Ok(FilterSpec::new()
            .with_date_range(range)
            .with_years(self.years.iter().copied())
            .with_months(&self.months)?
            .with_payment_methods(&self.payment_methods)
            .with_clients(&self.clients)
            .with_suppliers(&self.suppliers)
            .with_payment_mode(self.payment_mode.unwrap_or(default_mode)))
    }
}

pub(crate) fn load_dashboard(sources: &Sources) -> anyhow::Result<Dashboard> {
    let mut cache = TableCache::new();
    let dashboard = Dashboard::load(sources, &mut cache).with_context(|| {
        format!(
            "Failed to load {} / {}",
            sources.sales.display(),
            sources.purchases.display()
        )
    })?;
    log::debug!("{} distinct sources cached", cache.len());
    Ok(dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_build_spec() {
        let args = FilterArgs {
            from_date: Some("01/01/2024".into()),
            to_date: Some("2024-06-30".into()),
            years: vec![2024],
            months: vec!["enero".into()],
            payment_methods: vec!["Credito".into()],
            clients: vec![" A ".into()],
            ..Default::default()
        };
        let spec = args.to_spec(PaymentMode::Amount).unwrap();
        assert_eq!(spec.date_range().start, chrono::NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(spec.months().contains("Enero"));
        assert!(spec.payment_methods().contains("crédito"));
        assert!(spec.counterparties(Role::Sales).contains("A"));
        assert!(spec.counterparties(Role::Purchases).is_empty());
        assert_eq!(spec.payment_mode(), PaymentMode::Amount);
    }

    #[test]
    fn test_filter_args_reject_bad_input() {
        let bad_date = FilterArgs {
            from_date: Some("ayer".into()),
            ..Default::default()
        };
        assert!(bad_date.to_spec(PaymentMode::Count).is_err());

        let inverted = FilterArgs {
            from_date: Some("02/01/2024".into()),
            to_date: Some("01/01/2024".into()),
            ..Default::default()
        };
        assert!(inverted.to_spec(PaymentMode::Count).is_err());
    }

    #[test]
    fn test_source_args_override_settings() {
        let settings = Settings::default();
        let args = SourceArgs {
            sales: Some("v.csv".into()),
            ..Default::default()
        };
        let sources = args.resolve(&settings);
        assert_eq!(sources.sales, PathBuf::from("v.csv"));
        assert_eq!(sources.purchases, PathBuf::from(&settings.purchases_file));
    }

    #[test]
    fn test_cli_parses_repeated_filters() {
        let cli = Cli::try_parse_from([
            "tablero", "--sales", "v.csv", "report", "top", "--role", "purchases", "--year",
            "2023", "--year", "2024", "--month", "Enero",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Report { command }) => {
                let args = command.args();
                assert_eq!(args.role, Role::Purchases);
                assert_eq!(args.filters.years, vec![2023, 2024]);
            }
            _ => panic!("expected report command"),
        }
        assert_eq!(cli.source.sales.as_deref(), Some("v.csv"));
    }
}
