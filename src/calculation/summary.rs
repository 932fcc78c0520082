//! Yearly salary summaries.
//!
//! Rolls the derived totals of many salary records up into per-month rows
//! and a year total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PayrollResult;

use super::payroll::PayrollSummary;

/// Totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// Calendar month, 1-12.
    pub month: u32,
    /// Number of salary records that fell into this month.
    pub record_count: usize,
    /// Field-wise sum of the records' derived totals.
    #[serde(flatten)]
    pub totals: PayrollSummary,
}

/// Totals for one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlySummary {
    /// The summarised year.
    pub year: i32,
    /// The person summarised, or `None` for the whole family.
    pub person_id: Option<u64>,
    /// Number of salary records included.
    pub record_count: usize,
    /// Months that have at least one record, in calendar order.
    pub months: Vec<MonthlyTotals>,
    /// Field-wise sum over the whole year.
    pub totals: PayrollSummary,
}

/// Builds a yearly summary from `(month, derived totals)` pairs.
///
/// Several entries for the same month (one per family member) are summed
/// into one row. The inputs are already rounded to cents, so the sums stay
/// exact.
///
/// # Errors
///
/// Returns [`PayrollError::InvalidAmount`](crate::error::PayrollError::InvalidAmount)
/// if a sum overflows.
///
/// # Examples
///
/// ```
/// use salarium::calculation::{summarize_year, PayrollSummary};
/// use rust_decimal::Decimal;
///
/// let month = PayrollSummary {
///     net_income: Decimal::new(942000, 2),
///     ..Default::default()
/// };
/// let summary = summarize_year(2025, None, &[(1, month), (2, month)]).unwrap();
///
/// assert_eq!(summary.months.len(), 2);
/// assert_eq!(summary.totals.net_income, Decimal::new(1884000, 2));
/// ```
pub fn summarize_year(
    year: i32,
    person_id: Option<u64>,
    entries: &[(u32, PayrollSummary)],
) -> PayrollResult<YearlySummary> {
    let mut by_month: BTreeMap<u32, MonthlyTotals> = BTreeMap::new();
    let mut totals = PayrollSummary::default();

    for (month, summary) in entries {
        let row = by_month.entry(*month).or_insert_with(|| MonthlyTotals {
            month: *month,
            record_count: 0,
            totals: PayrollSummary::default(),
        });
        row.record_count += 1;
        row.totals.accumulate(summary)?;
        totals.accumulate(summary)?;
    }

    Ok(YearlySummary {
        year,
        person_id,
        record_count: entries.len(),
        months: by_month.into_values().collect(),
        totals,
    })
}
