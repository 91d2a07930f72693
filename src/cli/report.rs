use serde_json::json;

use crate::dashboard::Sources;
use crate::filters::FilteredResult;
use crate::models::Table;
use crate::settings::Settings;

use super::{load_dashboard, text, ReportCommands};

pub fn dispatch(cmd: &ReportCommands, sources: &Sources, settings: &Settings) -> anyhow::Result<()> {
    let args = cmd.args();
    let spec = args.filters.to_spec(settings.payment_mode)?;
    let dashboard = load_dashboard(sources)?;
    let result = dashboard.apply_role(&spec, args.role);

    if args.csv {
        return match cmd {
            ReportCommands::Rows(_) => write_csv(&result),
            _ => anyhow::bail!("--csv is only available for `report rows`"),
        };
    }

    if args.json {
        let value = match cmd {
            ReportCommands::Top(_) => json!(result.top_counterparties),
            ReportCommands::Monthly(_) => json!(result.monthly_totals),
            ReportCommands::Payments(_) => json!({
                "mode": result.payment_mode,
                "distribution": result.payment_method_distribution,
            }),
            ReportCommands::Rows(_) => json!({
                "row_count": result.row_count,
                "total_amount": result.total_amount,
                "rows": result.rows,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let out = match cmd {
        ReportCommands::Top(_) => text::format_top(&result),
        ReportCommands::Monthly(_) => text::format_monthly(&result),
        ReportCommands::Payments(_) => text::format_payments(&result),
        ReportCommands::Rows(_) => text::format_rows(&result),
    };
    println!("{out}");
    Ok(())
}

fn write_csv(result: &FilteredResult) -> anyhow::Result<()> {
    let raw = Table::new(result.rows.clone()).to_raw();
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record(&raw.headers)?;
    for row in &raw.rows {
        wtr.write_record(row.iter().map(|c| c.to_text()))?;
    }
    wtr.flush()?;
    Ok(())
}
