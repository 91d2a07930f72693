use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::aggregate::{PaymentMode, PeriodComparison};
use crate::dashboard::{DashboardView, FilterOptions};
use crate::filters::{DateRange, FilterSpec, FilteredResult};
use crate::fmt::money;
use crate::models::Role;

pub const NO_DATA: &str = "No hay datos para mostrar.";

fn amount_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn singular(role: Role) -> &'static str {
    match role {
        Role::Sales => "Cliente",
        Role::Purchases => "Proveedor",
    }
}

fn date_or_dash(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

// ---------------------------------------------------------------------------
// Chart tables
// ---------------------------------------------------------------------------

pub fn format_top(result: &FilteredResult) -> String {
    let title = format!("Top 10 {} por Monto", result.role.counterparty_label());
    if result.is_empty() {
        return format!("{title}\n{NO_DATA}");
    }
    let mut table = Table::new();
    table.set_header(vec!["#", singular(result.role), "Monto"]);
    for (i, c) in result.top_counterparties.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&c.name),
            amount_cell(money(c.total)),
        ]);
    }
    format!("{title}\n{table}")
}

pub fn format_monthly(result: &FilteredResult) -> String {
    let title = format!("Acumulado Mensual de {}", result.role.title());
    if result.is_empty() {
        return format!("{title}\n{NO_DATA}");
    }
    let mut table = Table::new();
    table.set_header(vec!["Mes", "Monto", "Acumulado"]);
    for m in &result.monthly_totals {
        table.add_row(vec![
            Cell::new(m.period),
            amount_cell(money(m.total)),
            amount_cell(money(m.running)),
        ]);
    }
    format!("{title}\n{table}")
}

pub fn format_payments(result: &FilteredResult) -> String {
    let title = format!(
        "Distribución por Forma de Pago ({})",
        result.role.title()
    );
    if result.is_empty() {
        return format!("{title}\n{NO_DATA}");
    }
    let (label, as_money) = match result.payment_mode {
        PaymentMode::Count => ("Cantidad", false),
        PaymentMode::Amount => ("Monto", true),
    };
    let whole: rust_decimal::Decimal = result
        .payment_method_distribution
        .iter()
        .map(|s| s.value)
        .sum();
    let mut table = Table::new();
    table.set_header(vec!["Forma de pago", label, "%"]);
    for s in &result.payment_method_distribution {
        let pct = if whole.is_zero() {
            rust_decimal::Decimal::ZERO
        } else {
            (s.value / whole * rust_decimal::Decimal::ONE_HUNDRED).round_dp(1)
        };
        let value = if as_money {
            money(s.value)
        } else {
            s.value.to_string()
        };
        table.add_row(vec![
            Cell::new(&s.method),
            amount_cell(value),
            amount_cell(format!("{pct:.1}%")),
        ]);
    }
    format!("{title}\n{table}")
}

pub fn format_rows(result: &FilteredResult) -> String {
    let title = format!("Transacciones de {}", result.role.title());
    if result.is_empty() {
        return format!("{title}\n{NO_DATA}");
    }
    let mut table = Table::new();
    table.set_header(vec!["Fecha", singular(result.role), "Forma de pago", "Monto"]);
    for r in &result.rows {
        table.add_row(vec![
            Cell::new(r.transaction_date.format("%d/%m/%Y")),
            Cell::new(&r.counterparty_name),
            Cell::new(&r.payment_method),
            amount_cell(money(r.amount)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(""),
        amount_cell(money(result.total_amount)),
    ]);
    format!("{title}\n{table}")
}

pub fn format_comparison(rows: &[PeriodComparison]) -> String {
    let title = "Ventas vs Compras por Mes";
    if rows.is_empty() {
        return format!("{title}\n{NO_DATA}");
    }
    let mut table = Table::new();
    table.set_header(vec!["Mes", "Ventas", "Compras", "Diferencia"]);
    for r in rows {
        let diff = r.sales - r.purchases;
        let diff_str = if diff.is_sign_negative() && !diff.is_zero() {
            money(diff).red().to_string()
        } else {
            money(diff).green().to_string()
        };
        table.add_row(vec![
            Cell::new(r.period),
            amount_cell(money(r.sales)),
            amount_cell(money(r.purchases)),
            amount_cell(diff_str),
        ]);
    }
    format!("{title}\n{table}")
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

pub fn format_section(result: &FilteredResult) -> String {
    let heading = result.role.title().to_uppercase();
    let heading = match result.role {
        Role::Sales => heading.green().bold(),
        Role::Purchases => heading.red().bold(),
    };
    let mut out = format!(
        "{heading}  {} transacciones, total {}\n",
        result.row_count,
        money(result.total_amount)
    );
    if result.is_empty() {
        out.push_str(NO_DATA);
        return out;
    }
    out.push_str(&format!(
        "\n{}\n\n{}\n\n{}",
        format_top(result),
        format_monthly(result),
        format_payments(result)
    ));
    out
}

pub fn format_active_filters(spec: &FilterSpec, range: DateRange) -> String {
    let join = |items: Vec<String>| {
        if items.is_empty() {
            "todos".to_string()
        } else {
            items.join(", ")
        }
    };
    let mut lines = vec![format!(
        "Rango de fechas: {} a {}",
        date_or_dash(range.start),
        date_or_dash(range.end)
    )];
    lines.push(format!(
        "Años: {}",
        join(spec.years().iter().map(|y| y.to_string()).collect())
    ));
    lines.push(format!("Meses: {}", join(spec.months().iter().cloned().collect())));
    lines.push(format!(
        "Forma de pago: {}",
        join(spec.payment_methods().iter().cloned().collect())
    ));
    for role in [Role::Sales, Role::Purchases] {
        let names = spec.counterparties(role);
        if !names.is_empty() {
            lines.push(format!(
                "{}: {}",
                role.counterparty_label(),
                join(names.iter().cloned().collect())
            ));
        }
    }
    lines.join("\n")
}

pub fn format_dashboard(view: &DashboardView, spec: &FilterSpec) -> String {
    format!(
        "Dashboard de Ventas y Compras\n{}\n\n{}\n\n{}\n\n{}",
        format_active_filters(spec, view.range),
        format_section(&view.sales),
        format_section(&view.purchases),
        format_comparison(&view.comparison)
    )
}

pub fn format_options(options: &FilterOptions) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Filtro", "Valores"]);
    table.add_row(vec![
        "Rango de fechas".to_string(),
        format!(
            "{} a {}",
            date_or_dash(options.first_date),
            date_or_dash(options.last_date)
        ),
    ]);
    table.add_row(vec![
        "Años".to_string(),
        options
            .years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    ]);
    table.add_row(vec!["Meses".to_string(), options.months.join(", ")]);
    table.add_row(vec![
        "Forma de pago".to_string(),
        options.payment_methods.join(", "),
    ]);
    table.add_row(vec!["Clientes".to_string(), options.clients.join(", ")]);
    table.add_row(vec!["Proveedores".to_string(), options.suppliers.join(", ")]);
    format!("Filtros disponibles\n{table}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::apply_filters;
    use crate::models::{RawCell, RawTable};
    use crate::normalizer::{normalize, ColumnAliases};

    fn sales_table() -> crate::models::Table {
        let text = |s: &str| RawCell::Text(s.to_string());
        let raw = RawTable {
            headers: vec![
                "FECHA".into(),
                "TOTAL".into(),
                "RAZON SOCIAL".into(),
                "FORMA DE PAGO".into(),
            ],
            rows: vec![
                vec![text("05/01/2024"), text("1500000"), text("Comercial Andes"), text("Efectivo")],
                vec![text("10/01/2024"), text("200"), text("Ferretería Sur"), text("credito")],
                vec![text("01/02/2024"), text("50"), text("Comercial Andes"), RawCell::Empty],
            ],
            ..Default::default()
        };
        normalize(&raw, &ColumnAliases::standard()).unwrap()
    }

    #[test]
    fn test_format_top_lists_counterparties() {
        let result = apply_filters(&sales_table(), &FilterSpec::new(), Role::Sales);
        let out = format_top(&result);
        assert!(out.starts_with("Top 10 Clientes por Monto"));
        assert!(out.contains("Comercial Andes"));
        assert!(out.contains("$1.500.050"));
    }

    #[test]
    fn test_format_monthly_has_running_total() {
        let result = apply_filters(&sales_table(), &FilterSpec::new(), Role::Purchases);
        let out = format_monthly(&result);
        assert!(out.starts_with("Acumulado Mensual de Compras"));
        assert!(out.contains("2024-02"));
        assert!(out.contains("$1.500.250"));
    }

    #[test]
    fn test_format_payments_count_and_percent() {
        let result = apply_filters(&sales_table(), &FilterSpec::new(), Role::Sales);
        let out = format_payments(&result);
        assert!(out.contains("Cantidad"));
        assert!(out.contains("no indica medio"));
        assert!(out.contains("33.3%"));
    }

    #[test]
    fn test_empty_section_says_no_data() {
        let spec = FilterSpec::new().with_years([1990]);
        let result = apply_filters(&sales_table(), &spec, Role::Sales);
        assert!(format_section(&result).contains(NO_DATA));
        assert!(format_top(&result).ends_with(NO_DATA));
        assert!(format_comparison(&[]).ends_with(NO_DATA));
    }

    #[test]
    fn test_active_filters_summary() {
        let spec = FilterSpec::new()
            .with_years([2024])
            .with_suppliers(["Proveedor Uno"]);
        let out = format_active_filters(&spec, DateRange::default());
        assert!(out.contains("Rango de fechas: - a -"));
        assert!(out.contains("Años: 2024"));
        assert!(out.contains("Meses: todos"));
        assert!(out.contains("Proveedores: Proveedor Uno"));
        assert!(!out.contains("Clientes"));
    }
}
