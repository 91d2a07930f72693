use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Record, YearMonth};

/// How many counterparties the ranking keeps.
pub const TOP_N: usize = 10;

/// What a payment-method slice measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Number of transactions.
    #[default]
    Count,
    /// Summed amount.
    Amount,
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "amount" => Ok(Self::Amount),
            other => Err(format!("unknown payment mode '{other}' (expected count or amount)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Result rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyTotal {
    pub name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub period: YearMonth,
    pub total: Decimal,
    /// Cumulative total up to and including `period`.
    pub running: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentShare {
    pub method: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub period: YearMonth,
    pub sales: Decimal,
    pub purchases: Decimal,
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

pub fn total_amount(records: &[Record]) -> Decimal {
    records.iter().map(|r| r.amount).sum()
}

/// Counterparties with the `n` largest summed amounts, largest first.
/// Equal totals are ordered by name ascending.
pub fn top_counterparties(records: &[Record], n: usize) -> Vec<CounterpartyTotal> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for r in records {
        *totals.entry(r.counterparty_name.as_str()).or_default() += r.amount;
    }
    let mut ranked: Vec<CounterpartyTotal> = totals
        .into_iter()
        .map(|(name, total)| CounterpartyTotal {
            name: name.to_string(),
            total,
        })
        .collect();
    // stable sort keeps the BTreeMap's name order among equal totals
    ranked.sort_by(|a, b| b.total.cmp(&a.total));
    ranked.truncate(n);
    ranked
}

/// Summed amount per calendar month present in `records`, oldest first.
pub fn monthly_totals(records: &[Record]) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<YearMonth, Decimal> = BTreeMap::new();
    for r in records {
        *by_month.entry(r.period()).or_default() += r.amount;
    }
    let mut running = Decimal::ZERO;
    by_month
        .into_iter()
        .map(|(period, total)| {
            running += total;
            MonthlyTotal {
                period,
                total,
                running,
            }
        })
        .collect()
}

/// Count or summed amount per payment method, in first-seen order.
pub fn payment_distribution(records: &[Record], mode: PaymentMode) -> Vec<PaymentShare> {
    let mut shares: Vec<PaymentShare> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for r in records {
        let value = match mode {
            PaymentMode::Count => Decimal::ONE,
            PaymentMode::Amount => r.amount,
        };
        match index.get(r.payment_method.as_str()) {
            Some(&i) => shares[i].value += value,
            None => {
                index.insert(r.payment_method.as_str(), shares.len());
                shares.push(PaymentShare {
                    method: r.payment_method.clone(),
                    value,
                });
            }
        }
    }
    shares
}

/// Outer-join two monthly series on their period; a missing side reads as zero.
pub fn compare_monthly(sales: &[MonthlyTotal], purchases: &[MonthlyTotal]) -> Vec<PeriodComparison> {
    let mut joined: BTreeMap<YearMonth, (Decimal, Decimal)> = BTreeMap::new();
    for m in sales {
        joined.entry(m.period).or_default().0 += m.total;
    }
    for m in purchases {
        joined.entry(m.period).or_default().1 += m.total;
    }
    joined
        .into_iter()
        .map(|(period, (sales, purchases))| PeriodComparison {
            period,
            sales,
            purchases,
        })
        .collect()
}
