use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SALES: &str = "\
FECHA,TOTAL,RAZON SOCIAL,FORMA DE PAGO
05/01/2024,100,A,Efectivo
10/01/2024,200,B,credito
01/02/2024,50,A,
15/03/2023,70,C,Transferencia
";

const PURCHASES: &str = "\
FECHA DOCUMENTO,TOTAL,RAZON SOCIAL,FORMA DE PAGO
20/12/2022,999,Viejo,efectivo
03/01/2024,40,Proveedor Uno,efectivo
09/02/2024,60,Proveedor Dos,credito
30/06/2024,25,Proveedor Uno,
";

struct Fixture {
    dir: TempDir,
    sales: PathBuf,
    purchases: PathBuf,
}

impl Fixture {
    fn new(sales: &str, purchases: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let sales_path = dir.path().join("ventas.csv");
        let purchases_path = dir.path().join("compras.csv");
        std::fs::write(&sales_path, sales).unwrap();
        std::fs::write(&purchases_path, purchases).unwrap();
        Self {
            dir,
            sales: sales_path,
            purchases: purchases_path,
        }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config").join("settings.json")
    }

    /// A command with isolated settings and the fixture files passed explicitly.
    fn cmd(&self) -> Command {
        let mut cmd = self.bare_cmd();
        cmd.arg("--sales")
            .arg(&self.sales)
            .arg("--purchases")
            .arg(&self.purchases);
        cmd
    }

    fn bare_cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tablero").unwrap();
        cmd.env("TABLERO_CONFIG", self.config())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_dashboard_text_shows_both_sections() {
    let fx = Fixture::new(SALES, PURCHASES);
    fx.cmd()
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dashboard de Ventas y Compras"))
        .stdout(predicate::str::contains("Rango de fechas: 15/03/2023 a 01/02/2024"))
        .stdout(predicate::str::contains("Top 10 Clientes por Monto"))
        .stdout(predicate::str::contains("Top 10 Proveedores por Monto"))
        .stdout(predicate::str::contains("Acumulado Mensual de Ventas"))
        .stdout(predicate::str::contains("Distribución por Forma de Pago (Compras)"))
        .stdout(predicate::str::contains("$420"));
}

#[test]
fn test_no_subcommand_runs_dashboard() {
    let fx = Fixture::new(SALES, PURCHASES);
    fx.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("Ventas vs Compras por Mes"));
}

#[test]
fn test_dashboard_json_applies_sales_range_to_purchases() {
    let fx = Fixture::new(SALES, PURCHASES);
    let v = json_stdout(fx.cmd().args(["dashboard", "--json"]));
    assert_eq!(v["sales"]["row_count"], 4);
    assert_eq!(v["purchases"]["row_count"], 1);
    assert_eq!(v["range"]["start"], "2023-03-15");
    assert_eq!(v["range"]["end"], "2024-02-01");
    assert_eq!(v["comparison"].as_array().unwrap().len(), 3);
}

#[test]
fn test_report_top_for_purchases() {
    let fx = Fixture::new(SALES, PURCHASES);
    fx.cmd()
        .args(["report", "top", "--role", "purchases", "--year", "2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Top 10 Proveedores por Monto"))
        .stdout(predicate::str::contains("Proveedor Uno"))
        .stdout(predicate::str::contains("Proveedor Dos").not());
}

#[test]
fn test_report_top_json_orders_by_total() {
    let fx = Fixture::new(SALES, PURCHASES);
    let v = json_stdout(fx.cmd().args(["report", "top", "--json"]));
    let names: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["B", "A", "C"]);
}

#[test]
fn test_report_payments_amount_mode() {
    let fx = Fixture::new(SALES, PURCHASES);
    let v = json_stdout(
        fx.cmd()
            .args(["report", "payments", "--payment-mode", "amount", "--json"]),
    );
    assert_eq!(v["mode"], "amount");
    let methods: Vec<&str> = v["distribution"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["method"].as_str().unwrap())
        .collect();
    assert_eq!(
        methods,
        vec!["efectivo", "crédito", "no indica medio", "transferencia"]
    );
}

#[test]
fn test_filters_with_no_match_print_no_data() {
    let fx = Fixture::new(SALES, PURCHASES);
    fx.cmd()
        .args(["report", "monthly", "--month", "Diciembre"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No hay datos para mostrar."));
}

#[test]
fn test_report_rows_csv_uses_canonical_headers() {
    let fx = Fixture::new(SALES, PURCHASES);
    fx.cmd()
        .args(["report", "rows", "--csv", "--client", "A"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "FECHA_TRANSACCION,MONTO,CLIENTE/PROVEEDOR,FORMA_DE_PAGO\n",
        ))
        .stdout(predicate::str::contains("2024-01-05,100,A,efectivo"))
        .stdout(predicate::str::contains("2024-02-01,50,A,no indica medio"));
}

#[test]
fn test_csv_flag_rejected_outside_rows() {
    let fx = Fixture::new(SALES, PURCHASES);
    fx.cmd()
        .args(["report", "top", "--csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only available for `report rows`"));
}

#[test]
fn test_options_json_lists_sales_values() {
    let fx = Fixture::new(SALES, PURCHASES);
    let v = json_stdout(fx.cmd().args(["options", "--json"]));
    assert_eq!(v["years"], serde_json::json!([2023, 2024]));
    assert_eq!(v["months"], serde_json::json!(["Enero", "Febrero", "Marzo"]));
    assert_eq!(
        v["suppliers"],
        serde_json::json!(["Proveedor Dos", "Proveedor Uno", "Viejo"])
    );
}

#[test]
fn test_schema_mismatch_fails_with_field_name() {
    let fx = Fixture::new(
        "FECHA,IMPORTE,RAZON SOCIAL\n05/01/2024,100,A\n",
        PURCHASES,
    );
    fx.cmd()
        .arg("dashboard")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Failed to load"))
        .stderr(predicate::str::contains(
            "No column found for required field 'amount'",
        ));
}

#[test]
fn test_bad_date_fails_whole_load() {
    let bad = SALES.replace("10/01/2024", "el martes");
    let fx = Fixture::new(&bad, PURCHASES);
    fx.cmd()
        .arg("dashboard")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unparsable date 'el martes' at row 1"));
}

#[test]
fn test_inverted_date_range_is_rejected() {
    let fx = Fixture::new(SALES, PURCHASES);
    fx.cmd()
        .args(["dashboard", "--from", "01/02/2024", "--to", "01/01/2024"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid filter"));
}

#[test]
fn test_missing_file_reports_path() {
    let fx = Fixture::new(SALES, PURCHASES);
    fx.bare_cmd()
        .args(["--sales", "/no/such/ventas.csv", "--purchases"])
        .arg(&fx.purchases)
        .arg("dashboard")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("/no/such/ventas.csv"));
}

#[test]
fn test_init_saves_settings_used_by_later_runs() {
    let fx = Fixture::new(SALES, PURCHASES);
    fx.cmd()
        .args(["init", "--payment-mode", "amount"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings saved to"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(fx.config()).unwrap()).unwrap();
    assert_eq!(saved["payment_mode"], "amount");
    assert!(Path::new(saved["sales_file"].as_str().unwrap()).ends_with("ventas.csv"));

    // No --sales/--purchases: the saved locations and mode are picked up.
    let v = json_stdout(fx.bare_cmd().args(["dashboard", "--json"]));
    assert_eq!(v["sales"]["row_count"], 4);
    assert_eq!(v["sales"]["payment_mode"], "amount");
}
