use colored::Colorize;

use crate::aggregate::PaymentMode;
use crate::settings::{save_settings, shellexpand_path, Settings};

use super::SourceArgs;

/// Merge the given locations into the saved settings and write them back.
pub fn run(source: &SourceArgs, payment_mode: Option<PaymentMode>, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(sales) = &source.sales {
        settings.sales_file = shellexpand_path(sales);
    }
    if let Some(purchases) = &source.purchases {
        settings.purchases_file = shellexpand_path(purchases);
    }
    if source.sheet.is_some() {
        settings.sheet = source.sheet.clone();
    }
    if let Some(mode) = payment_mode {
        settings.payment_mode = mode;
    }

    let path = save_settings(&settings)?;
    println!("{} {}", "Settings saved to".green(), path.display());
    println!("  Ventas:  {}", settings.sales_file);
    println!("  Compras: {}", settings.purchases_file);
    for (label, file) in [("Ventas", &settings.sales_file), ("Compras", &settings.purchases_file)] {
        if !std::path::Path::new(file).exists() {
            println!("{}", format!("  {label}: file not found yet").yellow());
        }
    }
    Ok(())
}
