//! Salary record model and related types.
//!
//! A [`SalaryRecord`] holds one month of fixed salary components for one
//! person. At most one record exists per person and calendar month.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PayrollError, PayrollResult};

/// Earliest year accepted for a salary record.
pub const MIN_YEAR: i32 = 1900;

/// Latest year accepted for a salary record.
pub const MAX_YEAR: i32 = 9999;

/// The fixed monetary components present on every salary record.
///
/// Every amount defaults to zero when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedFields {
    /// Base salary.
    #[serde(default)]
    pub base_salary: Decimal,
    /// Performance salary.
    #[serde(default)]
    pub performance_salary: Decimal,
    /// Pension insurance deduction.
    #[serde(default)]
    pub pension_insurance: Decimal,
    /// Medical insurance deduction.
    #[serde(default)]
    pub medical_insurance: Decimal,
    /// Unemployment insurance deduction.
    #[serde(default)]
    pub unemployment_insurance: Decimal,
    /// Critical illness insurance deduction.
    #[serde(default)]
    pub critical_illness_insurance: Decimal,
    /// Enterprise annuity deduction.
    #[serde(default)]
    pub enterprise_annuity: Decimal,
    /// Housing fund deduction.
    #[serde(default)]
    pub housing_fund: Decimal,
    /// Income tax withheld. Not part of total deductions.
    #[serde(default)]
    pub tax: Decimal,
}

/// Partial update of the fixed fields; `None` leaves a value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedFieldsPatch {
    /// New base salary.
    pub base_salary: Option<Decimal>,
    /// New performance salary.
    pub performance_salary: Option<Decimal>,
    /// New pension insurance.
    pub pension_insurance: Option<Decimal>,
    /// New medical insurance.
    pub medical_insurance: Option<Decimal>,
    /// New unemployment insurance.
    pub unemployment_insurance: Option<Decimal>,
    /// New critical illness insurance.
    pub critical_illness_insurance: Option<Decimal>,
    /// New enterprise annuity.
    pub enterprise_annuity: Option<Decimal>,
    /// New housing fund.
    pub housing_fund: Option<Decimal>,
    /// New tax.
    pub tax: Option<Decimal>,
}

impl FixedFieldsPatch {
    /// Applies the provided values onto `fields`.
    pub fn apply_to(&self, fields: &mut FixedFields) {
        let pairs = [
            (self.base_salary, &mut fields.base_salary),
            (self.performance_salary, &mut fields.performance_salary),
            (self.pension_insurance, &mut fields.pension_insurance),
            (self.medical_insurance, &mut fields.medical_insurance),
            (self.unemployment_insurance, &mut fields.unemployment_insurance),
            (
                self.critical_illness_insurance,
                &mut fields.critical_illness_insurance,
            ),
            (self.enterprise_annuity, &mut fields.enterprise_annuity),
            (self.housing_fund, &mut fields.housing_fund),
            (self.tax, &mut fields.tax),
        ];
        for (value, slot) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// One month of salary for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRecord {
    /// Unique identifier of the record.
    pub id: u64,
    /// The person this record belongs to.
    pub person_id: u64,
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Fixed monetary components.
    #[serde(flatten)]
    pub fixed: FixedFields,
    /// Free-form note.
    pub note: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new salary record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSalaryRecord {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Fixed monetary components.
    pub fixed: FixedFields,
    /// Free-form note.
    pub note: Option<String>,
}

/// Partial update of a salary record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalaryRecordUpdate {
    /// Fixed field changes.
    pub fixed: FixedFieldsPatch,
    /// `None` keeps the note, `Some(None)` clears it.
    pub note: Option<Option<String>>,
}

/// Filter for listing salary records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Only records of this person.
    #[serde(default)]
    pub person_id: Option<u64>,
    /// Only records of this year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Only records of this month.
    #[serde(default)]
    pub month: Option<u32>,
}

impl RecordFilter {
    /// Returns true if `record` passes this filter.
    pub fn matches(&self, record: &SalaryRecord) -> bool {
        self.person_id.is_none_or(|id| id == record.person_id)
            && self.year.is_none_or(|y| y == record.year)
            && self.month.is_none_or(|m| m == record.month)
    }
}

/// Validates that a year/month pair names a real calendar month.
///
/// # Examples
///
/// ```
/// use salarium::models::validate_period;
///
/// assert!(validate_period(2025, 12).is_ok());
/// assert!(validate_period(2025, 0).is_err());
/// assert!(validate_period(2025, 13).is_err());
/// ```
pub fn validate_period(year: i32, month: u32) -> PayrollResult<()> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) && (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(PayrollError::InvalidPeriod { year, month })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_fixed_fields_default_to_zero() {
        let fields: FixedFields = serde_json::from_str("{}").unwrap();
        assert_eq!(fields, FixedFields::default());
        assert_eq!(fields.tax, Decimal::ZERO);
    }

    #[test]
    fn test_patch_only_overwrites_provided_fields() {
        let mut fields = FixedFields {
            base_salary: dec("10000"),
            tax: dec("500"),
            ..Default::default()
        };
        let patch = FixedFieldsPatch {
            tax: Some(dec("450.50")),
            housing_fund: Some(dec("1000")),
            ..Default::default()
        };

        patch.apply_to(&mut fields);

        assert_eq!(fields.base_salary, dec("10000"));
        assert_eq!(fields.tax, dec("450.50"));
        assert_eq!(fields.housing_fund, dec("1000"));
    }

    #[test]
    fn test_record_serializes_fixed_fields_flat() {
        let record = SalaryRecord {
            id: 1,
            person_id: 2,
            year: 2025,
            month: 6,
            fixed: FixedFields {
                base_salary: dec("10000.00"),
                ..Default::default()
            },
            note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["base_salary"].as_str().unwrap(), "10000.00");
        assert!(json.get("fixed").is_none());

        let back: SalaryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_filter_matches_all_given_criteria() {
        let record = SalaryRecord {
            id: 1,
            person_id: 2,
            year: 2025,
            month: 6,
            fixed: FixedFields::default(),
            note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(RecordFilter::default().matches(&record));
        assert!(
            RecordFilter {
                person_id: Some(2),
                year: Some(2025),
                month: Some(6),
            }
            .matches(&record)
        );
        assert!(
            !RecordFilter {
                year: Some(2024),
                ..Default::default()
            }
            .matches(&record)
        );
    }

    #[test]
    fn test_validate_period_bounds() {
        assert!(validate_period(MIN_YEAR, 1).is_ok());
        assert!(validate_period(MAX_YEAR, 12).is_ok());
        assert!(matches!(
            validate_period(1899, 5),
            Err(PayrollError::InvalidPeriod {
                year: 1899,
                month: 5
            })
        ));
        assert!(validate_period(2025, 13).is_err());
    }
}
