//! Filtering of a canonical table and the aggregates shown for the result.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    monthly_totals, payment_distribution, top_counterparties, total_amount, CounterpartyTotal,
    MonthlyTotal, PaymentMode, PaymentShare, TOP_N,
};
use crate::error::{Result, TableroError};
use crate::models::{month_name, month_number, RawCell, Record, Role, Table};
use crate::normalizer::normalize_payment_method;

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Inclusive date interval; an unset bound does not restrict that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(TableroError::InvalidFilter(format!(
                    "date range start {s} is after end {e}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// Fill unset bounds from `bounds` (min, max), keeping explicit ones.
    pub fn or_defaults(self, bounds: Option<(NaiveDate, NaiveDate)>) -> Self {
        match bounds {
            Some((min, max)) => Self {
                start: self.start.or(Some(min)),
                end: self.end.or(Some(max)),
            },
            None => self,
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSpec
// ---------------------------------------------------------------------------

/// One filtering request. Built with the `with_*` methods and not changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSpec {
    date_range: DateRange,
    years: BTreeSet<i32>,
    months: BTreeSet<String>,
    payment_methods: BTreeSet<String>,
    clients: BTreeSet<String>,
    suppliers: BTreeSet<String>,
    payment_mode: PaymentMode,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn with_years<I: IntoIterator<Item = i32>>(mut self, years: I) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    /// Month names are matched ignoring case; unknown names are rejected.
    pub fn with_months<I, S>(mut self, months: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical = BTreeSet::new();
        for m in months {
            let name = month_number(m.as_ref())
                .and_then(month_name)
                .ok_or_else(|| {
                    TableroError::InvalidFilter(format!("unknown month '{}'", m.as_ref()))
                })?;
            canonical.insert(name.to_string());
        }
        self.months = canonical;
        Ok(self)
    }

    /// Payment methods go through the same clean-up as the loaded data.
    pub fn with_payment_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.payment_methods = methods
            .into_iter()
            .map(|m| normalize_payment_method(Some(&RawCell::Text(m.as_ref().to_string()))))
            .collect();
        self
    }

    pub fn with_clients<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clients = trimmed_set(names);
        self
    }

    pub fn with_suppliers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.suppliers = trimmed_set(names);
        self
    }

    pub fn with_payment_mode(mut self, mode: PaymentMode) -> Self {
        self.payment_mode = mode;
        self
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    pub fn months(&self) -> &BTreeSet<String> {
        &self.months
    }

    pub fn payment_methods(&self) -> &BTreeSet<String> {
        &self.payment_methods
    }

    /// Counterparty names that apply to a table of the given role.
    pub fn counterparties(&self, role: Role) -> &BTreeSet<String> {
        match role {
            Role::Sales => &self.clients,
            Role::Purchases => &self.suppliers,
        }
    }

    pub fn payment_mode(&self) -> PaymentMode {
        self.payment_mode
    }

    fn matches(&self, record: &Record, role: Role) -> bool {
        let counterparties = self.counterparties(role);
        self.date_range.contains(record.transaction_date)
            && (self.years.is_empty() || self.years.contains(&record.year))
            && (self.months.is_empty() || self.months.contains(&record.month_name))
            && (self.payment_methods.is_empty()
                || self.payment_methods.contains(&record.payment_method))
            && (counterparties.is_empty() || counterparties.contains(&record.counterparty_name))
    }
}

fn trimmed_set<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// apply_filters
// ---------------------------------------------------------------------------

/// Filtered rows of one table plus the aggregates derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredResult {
    pub role: Role,
    pub rows: Vec<Record>,
    pub row_count: usize,
    pub total_amount: Decimal,
    pub top_counterparties: Vec<CounterpartyTotal>,
    pub monthly_totals: Vec<MonthlyTotal>,
    pub payment_mode: PaymentMode,
    pub payment_method_distribution: Vec<PaymentShare>,
}

impl FilteredResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep the records of `table` that pass every active filter of `spec`, in
/// load order, and aggregate them. An empty selection yields zero aggregates.
pub fn apply_filters(table: &Table, spec: &FilterSpec, role: Role) -> FilteredResult {
    let rows: Vec<Record> = table
        .iter()
        .filter(|r| spec.matches(r, role))
        .cloned()
        .collect();
    log::debug!("{}: kept {} of {} rows", role.key(), rows.len(), table.len());

    FilteredResult {
        role,
        row_count: rows.len(),
        total_amount: total_amount(&rows),
        top_counterparties: top_counterparties(&rows, TOP_N),
        monthly_totals: monthly_totals(&rows),
        payment_mode: spec.payment_mode(),
        payment_method_distribution: payment_distribution(&rows, spec.payment_mode()),
        rows,
    }
}
