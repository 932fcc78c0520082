//! Payroll aggregation.
//!
//! This module turns one month of fixed salary components plus a list of
//! custom field contributions into the seven derived totals shown for a
//! salary record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PayrollError, PayrollResult};
use crate::models::{FieldType, FixedFields, ResolvedCustomValue};

use super::amount::{Amount, coerce_amount, round_currency};

fn default_field_type() -> String {
    FieldType::Income.as_str().to_string()
}

/// One custom field's contribution to a payroll calculation.
///
/// `field_type` is kept as free text: tags other than `income` and
/// `deduction` are accepted and contribute nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomContribution {
    /// `income` or `deduction`. Defaults to `income`.
    #[serde(default = "default_field_type")]
    pub field_type: String,
    /// Non-cash income is left out of actual take-home.
    #[serde(default)]
    pub is_non_cash: bool,
    /// The contributed amount. Absent means zero.
    #[serde(default)]
    pub amount: Option<Amount>,
}

impl CustomContribution {
    /// Creates a contribution with an exact amount.
    pub fn new(field_type: FieldType, is_non_cash: bool, amount: Decimal) -> Self {
        Self {
            field_type: field_type.as_str().to_string(),
            is_non_cash,
            amount: Some(Amount::Exact(amount)),
        }
    }
}

impl From<&ResolvedCustomValue> for CustomContribution {
    fn from(value: &ResolvedCustomValue) -> Self {
        CustomContribution::new(value.field.field_type, value.field.is_non_cash, value.amount)
    }
}

/// Input to [`compute_payroll`].
///
/// Every monetary field is optional and defaults to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollInput {
    /// Base salary.
    #[serde(default)]
    pub base_salary: Option<Amount>,
    /// Performance salary.
    #[serde(default)]
    pub performance_salary: Option<Amount>,
    /// Pension insurance deduction.
    #[serde(default)]
    pub pension_insurance: Option<Amount>,
    /// Medical insurance deduction.
    #[serde(default)]
    pub medical_insurance: Option<Amount>,
    /// Unemployment insurance deduction.
    #[serde(default)]
    pub unemployment_insurance: Option<Amount>,
    /// Critical illness insurance deduction.
    #[serde(default)]
    pub critical_illness_insurance: Option<Amount>,
    /// Enterprise annuity deduction.
    #[serde(default)]
    pub enterprise_annuity: Option<Amount>,
    /// Housing fund deduction.
    #[serde(default)]
    pub housing_fund: Option<Amount>,
    /// Pre-computed income tax.
    #[serde(default)]
    pub tax: Option<Amount>,
    /// Custom field contributions in display order.
    #[serde(default)]
    pub custom_fields: Vec<CustomContribution>,
}

impl PayrollInput {
    /// Builds an input from a stored record's fixed fields and its resolved
    /// custom values.
    pub fn from_record(fixed: &FixedFields, custom_values: &[ResolvedCustomValue]) -> Self {
        let exact = |value: Decimal| Some(Amount::Exact(value));
        Self {
            base_salary: exact(fixed.base_salary),
            performance_salary: exact(fixed.performance_salary),
            pension_insurance: exact(fixed.pension_insurance),
            medical_insurance: exact(fixed.medical_insurance),
            unemployment_insurance: exact(fixed.unemployment_insurance),
            critical_illness_insurance: exact(fixed.critical_illness_insurance),
            enterprise_annuity: exact(fixed.enterprise_annuity),
            housing_fund: exact(fixed.housing_fund),
            tax: exact(fixed.tax),
            custom_fields: custom_values.iter().map(CustomContribution::from).collect(),
        }
    }
}

/// The seven derived totals of a salary record.
///
/// Every value carries exactly two fractional digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollSummary {
    /// Base + performance + all custom income.
    pub total_income: Decimal,
    /// Statutory deductions + housing fund + custom deductions. Excludes tax.
    pub total_deductions: Decimal,
    /// Same value as `total_income`.
    pub gross_income: Decimal,
    /// The supplied tax, rounded.
    pub tax: Decimal,
    /// Gross income minus deductions and tax.
    pub net_income: Decimal,
    /// Cash income minus deductions and tax.
    pub actual_take_home: Decimal,
    /// Custom income marked as non-cash.
    pub non_cash_benefits: Decimal,
}

impl PayrollSummary {
    /// Adds every field of `other` onto `self`.
    ///
    /// # Errors
    ///
    /// Returns [`PayrollError::InvalidAmount`] if any sum overflows; `self`
    /// is left unchanged.
    pub fn accumulate(&mut self, other: &PayrollSummary) -> PayrollResult<()> {
        *self = PayrollSummary {
            total_income: add(self.total_income, other.total_income)?,
            total_deductions: add(self.total_deductions, other.total_deductions)?,
            gross_income: add(self.gross_income, other.gross_income)?,
            tax: add(self.tax, other.tax)?,
            net_income: add(self.net_income, other.net_income)?,
            actual_take_home: add(self.actual_take_home, other.actual_take_home)?,
            non_cash_benefits: add(self.non_cash_benefits, other.non_cash_benefits)?,
        };
        Ok(())
    }
}

fn out_of_range(a: Decimal, op: char, b: Decimal) -> PayrollError {
    PayrollError::InvalidAmount {
        value: format!("{} {} {}", a, op, b),
        message: "result is out of range".to_string(),
    }
}

fn add(a: Decimal, b: Decimal) -> PayrollResult<Decimal> {
    a.checked_add(b).ok_or_else(|| out_of_range(a, '+', b))
}

fn sub(a: Decimal, b: Decimal) -> PayrollResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| out_of_range(a, '-', b))
}

#[derive(Debug, Default)]
struct CustomTotals {
    income: Decimal,
    cash_income: Decimal,
    non_cash: Decimal,
    deductions: Decimal,
}

fn accumulate_custom(custom_fields: &[CustomContribution]) -> PayrollResult<CustomTotals> {
    let mut totals = CustomTotals::default();

    for contribution in custom_fields {
        let amount = coerce_amount(contribution.amount.as_ref())?;

        match contribution.field_type.parse::<FieldType>() {
            Ok(FieldType::Income) => {
                totals.income = add(totals.income, amount)?;
                if contribution.is_non_cash {
                    totals.non_cash = add(totals.non_cash, amount)?;
                } else {
                    totals.cash_income = add(totals.cash_income, amount)?;
                }
            }
            Ok(FieldType::Deduction) => totals.deductions = add(totals.deductions, amount)?,
            Err(_) => {
                debug!(
                    field_type = %contribution.field_type,
                    "Ignoring custom contribution with unknown field type"
                );
            }
        }
    }

    Ok(totals)
}

/// Aggregates fixed and custom salary components into derived totals.
///
/// Inputs are coerced to exact decimals and summed without intermediate
/// rounding; each of the seven outputs is then rounded half-up to two
/// decimal places on its own.
///
/// - `total_income` = base + performance + custom income
/// - `total_deductions` = pension + medical + unemployment + critical illness
///   + enterprise annuity + housing fund + custom deductions
/// - `net_income` = gross income - total deductions - tax
/// - `actual_take_home` = base + performance + cash custom income
///   - total deductions - tax
///
/// The routine is pure: it reads nothing but its input and keeps no state.
///
/// # Errors
///
/// Returns [`PayrollError::InvalidAmount`] when an amount cannot be coerced
/// (see [`Amount::to_decimal`]) or a total overflows.
///
/// # Examples
///
/// ```
/// use salarium::calculation::{compute_payroll, PayrollInput};
/// use rust_decimal::Decimal;
///
/// let input = PayrollInput {
///     base_salary: Some(Decimal::from(10000).into()),
///     performance_salary: Some("2000".into()),
///     housing_fund: Some(Decimal::from(1000).into()),
///     tax: Some(Decimal::from(500).into()),
///     ..Default::default()
/// };
///
/// let summary = compute_payroll(&input).unwrap();
/// assert_eq!(summary.total_income.to_string(), "12000.00");
/// assert_eq!(summary.net_income.to_string(), "10500.00");
/// ```
pub fn compute_payroll(input: &PayrollInput) -> PayrollResult<PayrollSummary> {
    let base_salary = coerce_amount(input.base_salary.as_ref())?;
    let performance_salary = coerce_amount(input.performance_salary.as_ref())?;

    let statutory = [
        &input.pension_insurance,
        &input.medical_insurance,
        &input.unemployment_insurance,
        &input.critical_illness_insurance,
        &input.enterprise_annuity,
        &input.housing_fund,
    ]
    .into_iter()
    .try_fold(Decimal::ZERO, |sum, amount| {
        add(sum, coerce_amount(amount.as_ref())?)
    })?;
    let tax = coerce_amount(input.tax.as_ref())?;

    let custom = accumulate_custom(&input.custom_fields)?;

    let fixed_income = add(base_salary, performance_salary)?;
    let non_cash_benefits = round_currency(custom.non_cash);
    let total_income = round_currency(add(fixed_income, custom.income)?);
    let total_deductions = round_currency(add(statutory, custom.deductions)?);
    let gross_income = total_income;
    let net_income = round_currency(sub(sub(gross_income, total_deductions)?, tax)?);
    let cash_income = add(fixed_income, custom.cash_income)?;
    let actual_take_home = round_currency(sub(sub(cash_income, total_deductions)?, tax)?);

    Ok(PayrollSummary {
        total_income,
        total_deductions,
        gross_income,
        tax: round_currency(tax),
        net_income,
        actual_take_home,
        non_cash_benefits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn amt(s: &str) -> Option<Amount> {
        Some(Amount::Exact(dec(s)))
    }

    /// Base salary 10000, performance 2000, standard statutory deductions.
    fn scenario_a() -> PayrollInput {
        PayrollInput {
            base_salary: amt("10000"),
            performance_salary: amt("2000"),
            pension_insurance: amt("800"),
            medical_insurance: amt("200"),
            unemployment_insurance: amt("50"),
            critical_illness_insurance: amt("30"),
            enterprise_annuity: amt("0"),
            housing_fund: amt("1000"),
            tax: amt("500"),
            custom_fields: vec![],
        }
    }

    #[test]
    fn test_all_zero_inputs_give_zero_outputs() {
        let summary = compute_payroll(&PayrollInput::default()).unwrap();

        for value in [
            summary.total_income,
            summary.total_deductions,
            summary.gross_income,
            summary.tax,
            summary.net_income,
            summary.actual_take_home,
            summary.non_cash_benefits,
        ] {
            assert_eq!(value.to_string(), "0.00");
        }
    }

    #[test]
    fn test_scenario_a_fixed_fields_only() {
        let summary = compute_payroll(&scenario_a()).unwrap();

        assert_eq!(summary.total_income, dec("12000.00"));
        assert_eq!(summary.total_deductions, dec("2080.00"));
        assert_eq!(summary.gross_income, dec("12000.00"));
        assert_eq!(summary.tax, dec("500.00"));
        assert_eq!(summary.net_income, dec("9420.00"));
        assert_eq!(summary.actual_take_home, dec("9420.00"));
        assert_eq!(summary.non_cash_benefits, dec("0.00"));
    }

    #[test]
    fn test_scenario_b_non_cash_income_excluded_from_take_home() {
        let mut input = scenario_a();
        input
            .custom_fields
            .push(CustomContribution::new(FieldType::Income, true, dec("500")));

        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary.total_income, dec("12500.00"));
        assert_eq!(summary.non_cash_benefits, dec("500.00"));
        assert_eq!(summary.net_income, dec("9920.00"));
        assert_eq!(summary.actual_take_home, dec("9420.00"));
    }

    #[test]
    fn test_scenario_c_custom_deduction() {
        let mut input = scenario_a();
        input.custom_fields.push(CustomContribution::new(
            FieldType::Deduction,
            false,
            dec("300"),
        ));

        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary.total_deductions, dec("2380.00"));
        assert_eq!(summary.net_income, dec("9120.00"));
        assert_eq!(summary.actual_take_home, dec("9120.00"));
    }

    #[test]
    fn test_cash_custom_income_counts_towards_take_home() {
        let mut input = scenario_a();
        input
            .custom_fields
            .push(CustomContribution::new(FieldType::Income, false, dec("250.50")));

        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary.total_income, dec("12250.50"));
        assert_eq!(summary.net_income, dec("9670.50"));
        assert_eq!(summary.actual_take_home, dec("9670.50"));
        assert_eq!(summary.non_cash_benefits, dec("0.00"));
    }

    #[test]
    fn test_tax_is_not_a_deduction() {
        let mut input = scenario_a();
        let before = compute_payroll(&input).unwrap();

        input.tax = amt("1234.56");
        let after = compute_payroll(&input).unwrap();

        assert_eq!(before.total_deductions, after.total_deductions);
        assert_eq!(after.tax, dec("1234.56"));
        assert_eq!(after.net_income, dec("8685.44"));
    }

    #[test]
    fn test_unknown_field_type_is_ignored() {
        let mut input = scenario_a();
        input.custom_fields.push(CustomContribution {
            field_type: "reimbursement".to_string(),
            is_non_cash: false,
            amount: amt("999"),
        });

        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary, compute_payroll(&scenario_a()).unwrap());
    }

    #[test]
    fn test_non_cash_flag_on_deduction_has_no_special_effect() {
        let mut input = scenario_a();
        input.custom_fields.push(CustomContribution::new(
            FieldType::Deduction,
            true,
            dec("100"),
        ));

        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary.total_deductions, dec("2180.00"));
        assert_eq!(summary.non_cash_benefits, dec("0.00"));
        assert_eq!(summary.net_income, summary.actual_take_home);
    }

    #[test]
    fn test_string_inputs_are_coerced() {
        let input = PayrollInput {
            base_salary: Some("10000.10".into()),
            tax: Some("0.1".into()),
            custom_fields: vec![CustomContribution {
                field_type: "income".to_string(),
                is_non_cash: false,
                amount: Some("0.2".into()),
            }],
            ..Default::default()
        };

        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary.total_income, dec("10000.30"));
        assert_eq!(summary.net_income, dec("10000.20"));
    }

    #[test]
    fn test_invalid_amount_propagates() {
        let input = PayrollInput {
            medical_insurance: Some("2O0".into()),
            ..Default::default()
        };

        assert!(matches!(
            compute_payroll(&input),
            Err(PayrollError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_invalid_custom_amount_propagates() {
        let input = PayrollInput {
            custom_fields: vec![CustomContribution {
                field_type: "deduction".to_string(),
                is_non_cash: false,
                amount: Some("n/a".into()),
            }],
            ..Default::default()
        };

        assert!(matches!(
            compute_payroll(&input),
            Err(PayrollError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_outputs_rounded_half_up_independently() {
        let input = PayrollInput {
            base_salary: amt("0.005"),
            pension_insurance: amt("0.005"),
            tax: amt("0.005"),
            custom_fields: vec![CustomContribution::new(
                FieldType::Income,
                true,
                dec("0.005"),
            )],
            ..Default::default()
        };

        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary.total_income, dec("0.01"));
        assert_eq!(summary.total_deductions, dec("0.01"));
        assert_eq!(summary.tax, dec("0.01"));
        assert_eq!(summary.non_cash_benefits, dec("0.01"));
        // 0.01 - 0.01 - 0.005 = -0.005
        assert_eq!(summary.net_income, dec("-0.01"));
        // 0.005 - 0.01 - 0.005 = -0.01
        assert_eq!(summary.actual_take_home, dec("-0.01"));
    }

    #[test]
    fn test_custom_amounts_are_not_rounded_before_summing() {
        let custom_fields = (0..3)
            .map(|_| CustomContribution::new(FieldType::Income, false, dec("0.004")))
            .collect();
        let input = PayrollInput {
            custom_fields,
            ..Default::default()
        };

        let summary = compute_payroll(&input).unwrap();

        // 3 x 0.004 = 0.012, not 3 x 0.00
        assert_eq!(summary.total_income, dec("0.01"));
    }

    #[test]
    fn test_missing_contribution_fields_use_defaults() {
        let json = r#"{
            "base_salary": 100,
            "custom_fields": [{"amount": "50"}, {"field_type": "deduction"}]
        }"#;
        let input: PayrollInput = serde_json::from_str(json).unwrap();

        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary.total_income, dec("150.00"));
        assert_eq!(summary.total_deductions, dec("0.00"));
    }

    #[test]
    fn test_from_record_resolves_custom_values() {
        use crate::models::SalaryField;
        use chrono::Utc;

        let field = SalaryField {
            id: 1,
            user_id: 1,
            name: "Stock grant".to_string(),
            field_key: "rsu".to_string(),
            field_type: FieldType::Income,
            category: "bonus".to_string(),
            is_non_cash: true,
            display_order: 0,
            is_active: true,
            created_at: Utc::now(),
        };
        let fixed = FixedFields {
            base_salary: dec("10000"),
            ..Default::default()
        };
        let values = vec![ResolvedCustomValue {
            field,
            amount: dec("500"),
        }];

        let input = PayrollInput::from_record(&fixed, &values);
        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary.total_income, dec("10500.00"));
        assert_eq!(summary.actual_take_home, dec("10000.00"));
        assert_eq!(summary.non_cash_benefits, dec("500.00"));
    }

    #[test]
    fn test_summary_accumulate_adds_every_field() {
        let summary = compute_payroll(&scenario_a()).unwrap();
        let mut total = PayrollSummary::default();

        total.accumulate(&summary).unwrap();
        total.accumulate(&summary).unwrap();

        assert_eq!(total.total_income, dec("24000.00"));
        assert_eq!(total.net_income, dec("18840.00"));
        assert_eq!(total.tax, dec("1000.00"));
    }

    #[test]
    fn test_oversized_amount_is_rejected_not_panicking() {
        let input = PayrollInput {
            base_salary: Some("79228162514264337593543950335".into()),
            performance_salary: amt("1"),
            ..Default::default()
        };

        assert!(matches!(
            compute_payroll(&input),
            Err(PayrollError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_largest_allowed_amounts_sum_without_overflow() {
        let max = "9999999999999.99";
        let input = PayrollInput {
            base_salary: amt(max),
            performance_salary: amt(max),
            pension_insurance: amt(max),
            tax: Some(Amount::Exact(-dec(max))),
            custom_fields: (0..50)
                .map(|_| CustomContribution::new(FieldType::Income, true, dec(max)))
                .collect(),
            ..Default::default()
        };

        let summary = compute_payroll(&input).unwrap();

        assert_eq!(summary.total_income, dec("519999999999999.48"));
        assert_eq!(summary.non_cash_benefits, dec("499999999999999.50"));
    }

    #[test]
    fn test_accumulate_overflow_leaves_summary_unchanged() {
        let mut total = PayrollSummary {
            total_income: Decimal::MAX,
            ..Default::default()
        };
        let before = total;
        let step = PayrollSummary {
            total_income: dec("1"),
            net_income: dec("5"),
            ..Default::default()
        };

        assert!(matches!(
            total.accumulate(&step),
            Err(PayrollError::InvalidAmount { .. })
        ));
        assert_eq!(total, before);
    }
}
