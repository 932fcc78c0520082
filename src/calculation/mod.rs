//! Calculation logic for the payroll tracker.
//!
//! This module contains amount coercion and half-up currency rounding, the
//! payroll aggregator that derives gross, net and take-home figures, the
//! category validator for custom field definitions, and yearly roll-ups.

mod amount;
mod field_validation;
mod payroll;
mod summary;

pub use amount::{
    Amount, CURRENCY_SCALE, MAX_INTEGER_DIGITS, check_amount, coerce_amount, round_currency,
};
pub use field_validation::{validate_category, validate_field_update, validate_new_field};
pub use payroll::{CustomContribution, PayrollInput, PayrollSummary, compute_payroll};
pub use summary::{MonthlyTotals, YearlySummary, summarize_year};
