use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{compare_monthly, PeriodComparison};
use crate::cache::TableCache;
use crate::error::Result;
use crate::filters::{apply_filters, DateRange, FilterSpec, FilteredResult};
use crate::models::{month_number, Role, Table, MONTH_NAMES};
use crate::normalizer::ColumnAliases;

/// Where the two tables come from.
#[derive(Debug, Clone)]
pub struct Sources {
    pub sales: PathBuf,
    pub purchases: PathBuf,
    pub sheet: Option<String>,
}

/// Filter choices offered to the user, derived from the loaded data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub years: Vec<i32>,
    pub months: Vec<String>,
    pub payment_methods: Vec<String>,
    pub clients: Vec<String>,
    pub suppliers: Vec<String>,
}

/// Both filtered tables for one filter request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Date range after filling unset bounds from the sales data.
    pub range: DateRange,
    pub sales: FilteredResult,
    pub purchases: FilteredResult,
    pub comparison: Vec<PeriodComparison>,
}

/// The sales and purchases tables side by side. They are never merged.
#[derive(Debug, Clone)]
pub struct Dashboard {
    sales: Arc<Table>,
    purchases: Arc<Table>,
}

impl Dashboard {
    pub fn new(sales: Arc<Table>, purchases: Arc<Table>) -> Self {
        Self { sales, purchases }
    }

    pub fn load(sources: &Sources, cache: &mut TableCache) -> Result<Self> {
        let aliases = ColumnAliases::standard();
        let sheet = sources.sheet.as_deref();
        let sales = cache.get_or_load(&sources.sales, sheet, &aliases)?;
        let purchases = cache.get_or_load(&sources.purchases, sheet, &aliases)?;
        log::info!(
            "loaded {} sales and {} purchases records",
            sales.len(),
            purchases.len()
        );
        Ok(Self::new(sales, purchases))
    }

    pub fn table(&self, role: Role) -> &Table {
        match role {
            Role::Sales => &self.sales,
            Role::Purchases => &self.purchases,
        }
    }

    /// Unset date bounds of `spec`, filled from the sales table for both roles.
    pub fn effective_range(&self, spec: &FilterSpec) -> DateRange {
        spec.date_range().or_defaults(self.sales.date_bounds())
    }

    pub fn apply_role(&self, spec: &FilterSpec, role: Role) -> FilteredResult {
        let spec = spec.clone().with_date_range(self.effective_range(spec));
        apply_filters(self.table(role), &spec, role)
    }

    pub fn apply(&self, spec: &FilterSpec) -> DashboardView {
        let range = self.effective_range(spec);
        let spec = spec.clone().with_date_range(range);
        let sales = apply_filters(&self.sales, &spec, Role::Sales);
        let purchases = apply_filters(&self.purchases, &spec, Role::Purchases);
        let comparison = compare_monthly(&sales.monthly_totals, &purchases.monthly_totals);
        DashboardView {
            range,
            sales,
            purchases,
            comparison,
        }
    }

    /// Years, months and payment methods come from the sales table.
    pub fn options(&self) -> FilterOptions {
        let bounds = self.sales.date_bounds();
        let years: BTreeSet<i32> = self.sales.iter().map(|r| r.year).collect();
        let present: BTreeSet<u32> = self
            .sales
            .iter()
            .filter_map(|r| month_number(&r.month_name))
            .collect();
        let months = present
            .into_iter()
            .map(|m| MONTH_NAMES[(m - 1) as usize].to_string())
            .collect();

        let mut payment_methods: Vec<String> = Vec::new();
        for r in self.sales.iter() {
            if !payment_methods.contains(&r.payment_method) {
                payment_methods.push(r.payment_method.clone());
            }
        }

        FilterOptions {
            first_date: bounds.map(|(min, _)| min),
            last_date: bounds.map(|(_, max)| max),
            years: years.into_iter().collect(),
            months,
            payment_methods,
            clients: distinct_names(&self.sales),
            suppliers: distinct_names(&self.purchases),
        }
    }
}

fn distinct_names(table: &Table) -> Vec<String> {
    table
        .iter()
        .map(|r| r.counterparty_name.clone())
        .filter(|n| !n.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
