//! Request types for the payroll tracker API.
//!
//! Monetary fields arrive as [`Amount`] so that numeric strings are accepted
//! and bad values surface as `INVALID_AMOUNT` rather than a generic JSON
//! error. Conversion into domain types happens here.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::calculation::{Amount, coerce_amount};
use crate::error::PayrollResult;
use crate::models::{
    FieldFilter, FieldType, FixedFields, FixedFieldsPatch, NewSalaryField, NewSalaryRecord,
    SalaryRecordUpdate,
};
use crate::store::CustomFieldMap;

/// Body of `/auth/register` and `/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

/// Body for creating a custom field definition.
///
/// `field_type` is free text here so an unknown type is reported as
/// `INVALID_FIELD_TYPE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryFieldCreateRequest {
    /// Display name.
    pub name: String,
    /// Unique key per user.
    pub field_key: String,
    /// `income` or `deduction`.
    pub field_type: String,
    /// Category key.
    pub category: String,
    /// Whether the field is a non-cash benefit.
    #[serde(default)]
    pub is_non_cash: bool,
    /// Sort order.
    #[serde(default)]
    pub display_order: i32,
}

impl TryFrom<SalaryFieldCreateRequest> for NewSalaryField {
    type Error = crate::error::PayrollError;

    fn try_from(req: SalaryFieldCreateRequest) -> Result<Self, Self::Error> {
        Ok(NewSalaryField {
            name: req.name,
            field_key: req.field_key,
            field_type: req.field_type.parse()?,
            category: req.category,
            is_non_cash: req.is_non_cash,
            display_order: req.display_order,
        })
    }
}

/// Query string of `GET /salary-fields`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalaryFieldQuery {
    /// Only fields of this type.
    #[serde(default)]
    pub field_type: Option<String>,
    /// Include soft-deleted fields.
    #[serde(default)]
    pub include_inactive: bool,
}

impl SalaryFieldQuery {
    /// Converts the query into a store filter.
    pub fn to_filter(&self) -> PayrollResult<FieldFilter> {
        let field_type = match self.field_type.as_deref() {
            Some(raw) => Some(raw.parse::<FieldType>()?),
            None => None,
        };
        Ok(FieldFilter {
            field_type,
            include_inactive: self.include_inactive,
        })
    }
}

/// Body of `POST /salaries/{person_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryCreateRequest {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Base salary.
    #[serde(default)]
    pub base_salary: Option<Amount>,
    /// Performance salary.
    #[serde(default)]
    pub performance_salary: Option<Amount>,
    /// Pension insurance.
    #[serde(default)]
    pub pension_insurance: Option<Amount>,
    /// Medical insurance.
    #[serde(default)]
    pub medical_insurance: Option<Amount>,
    /// Unemployment insurance.
    #[serde(default)]
    pub unemployment_insurance: Option<Amount>,
    /// Critical illness insurance.
    #[serde(default)]
    pub critical_illness_insurance: Option<Amount>,
    /// Enterprise annuity.
    #[serde(default)]
    pub enterprise_annuity: Option<Amount>,
    /// Housing fund.
    #[serde(default)]
    pub housing_fund: Option<Amount>,
    /// Income tax.
    #[serde(default)]
    pub tax: Option<Amount>,
    /// Free-form note.
    #[serde(default)]
    pub note: Option<String>,
    /// Custom amounts keyed by field key.
    #[serde(default)]
    pub custom_fields: Option<BTreeMap<String, Amount>>,
}

impl SalaryCreateRequest {
    /// Coerces every amount and splits the body into the record and its
    /// custom values.
    pub fn into_parts(self) -> PayrollResult<(NewSalaryRecord, Option<CustomFieldMap>)> {
        let fixed = FixedFields {
            base_salary: coerce_amount(self.base_salary.as_ref())?,
            performance_salary: coerce_amount(self.performance_salary.as_ref())?,
            pension_insurance: coerce_amount(self.pension_insurance.as_ref())?,
            medical_insurance: coerce_amount(self.medical_insurance.as_ref())?,
            unemployment_insurance: coerce_amount(self.unemployment_insurance.as_ref())?,
            critical_illness_insurance: coerce_amount(self.critical_illness_insurance.as_ref())?,
            enterprise_annuity: coerce_amount(self.enterprise_annuity.as_ref())?,
            housing_fund: coerce_amount(self.housing_fund.as_ref())?,
            tax: coerce_amount(self.tax.as_ref())?,
        };
        let record = NewSalaryRecord {
            year: self.year,
            month: self.month,
            fixed,
            note: self.note,
        };
        Ok((record, coerce_custom(self.custom_fields)?))
    }
}

/// Body of `PUT /salaries/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalaryUpdateRequest {
    /// Base salary.
    #[serde(default)]
    pub base_salary: Option<Amount>,
    /// Performance salary.
    #[serde(default)]
    pub performance_salary: Option<Amount>,
    /// Pension insurance.
    #[serde(default)]
    pub pension_insurance: Option<Amount>,
    /// Medical insurance.
    #[serde(default)]
    pub medical_insurance: Option<Amount>,
    /// Unemployment insurance.
    #[serde(default)]
    pub unemployment_insurance: Option<Amount>,
    /// Critical illness insurance.
    #[serde(default)]
    pub critical_illness_insurance: Option<Amount>,
    /// Enterprise annuity.
    #[serde(default)]
    pub enterprise_annuity: Option<Amount>,
    /// Housing fund.
    #[serde(default)]
    pub housing_fund: Option<Amount>,
    /// Income tax.
    #[serde(default)]
    pub tax: Option<Amount>,
    /// Replacement note. An explicit `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub note: Option<Option<String>>,
    /// Replacement custom amounts. An empty map clears them.
    #[serde(default)]
    pub custom_fields: Option<BTreeMap<String, Amount>>,
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn coerce_optional(amount: Option<&Amount>) -> PayrollResult<Option<rust_decimal::Decimal>> {
    amount.map(|a| a.to_decimal()).transpose()
}

impl SalaryUpdateRequest {
    /// Coerces every provided amount and splits the body into the patch and
    /// the replacement custom values.
    pub fn into_parts(self) -> PayrollResult<(SalaryRecordUpdate, Option<CustomFieldMap>)> {
        let fixed = FixedFieldsPatch {
            base_salary: coerce_optional(self.base_salary.as_ref())?,
            performance_salary: coerce_optional(self.performance_salary.as_ref())?,
            pension_insurance: coerce_optional(self.pension_insurance.as_ref())?,
            medical_insurance: coerce_optional(self.medical_insurance.as_ref())?,
            unemployment_insurance: coerce_optional(self.unemployment_insurance.as_ref())?,
            critical_illness_insurance: coerce_optional(
                self.critical_illness_insurance.as_ref(),
            )?,
            enterprise_annuity: coerce_optional(self.enterprise_annuity.as_ref())?,
            housing_fund: coerce_optional(self.housing_fund.as_ref())?,
            tax: coerce_optional(self.tax.as_ref())?,
        };
        let update = SalaryRecordUpdate {
            fixed,
            note: self.note,
        };
        Ok((update, coerce_custom(self.custom_fields)?))
    }
}

fn coerce_custom(
    custom: Option<BTreeMap<String, Amount>>,
) -> PayrollResult<Option<CustomFieldMap>> {
    custom
        .map(|map| {
            map.into_iter()
                .map(|(key, amount)| Ok((key, amount.to_decimal()?)))
                .collect::<PayrollResult<CustomFieldMap>>()
        })
        .transpose()
}

/// Query string of `GET /stats/yearly`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyStatsQuery {
    /// The year to summarise.
    pub year: i32,
    /// Restrict to one person.
    #[serde(default)]
    pub person_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PayrollError;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_create_request_accepts_numbers_and_strings() {
        let json = r#"{
            "year": 2025,
            "month": 3,
            "base_salary": 10000,
            "tax": "500.50",
            "custom_fields": {"rsu": "2000"}
        }"#;
        let request: SalaryCreateRequest = serde_json::from_str(json).unwrap();
        let (record, custom) = request.into_parts().unwrap();

        assert_eq!(record.fixed.base_salary, dec("10000"));
        assert_eq!(record.fixed.tax, dec("500.50"));
        assert_eq!(record.fixed.housing_fund, Decimal::ZERO);
        assert_eq!(custom.unwrap()["rsu"], dec("2000"));
    }

    #[test]
    fn test_create_request_rejects_bad_amount() {
        let json = r#"{"year": 2025, "month": 3, "base_salary": "ten"}"#;
        let request: SalaryCreateRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(
            request.into_parts(),
            Err(PayrollError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_update_request_keeps_absent_fields_unset() {
        let request: SalaryUpdateRequest = serde_json::from_str(r#"{"tax": 650}"#).unwrap();
        let (update, custom) = request.into_parts().unwrap();

        assert_eq!(update.fixed.tax, Some(dec("650")));
        assert_eq!(update.fixed.base_salary, None);
        assert!(custom.is_none());
    }

    #[test]
    fn test_update_request_null_note_clears_it() {
        let absent: SalaryUpdateRequest = serde_json::from_str(r#"{"tax": 650}"#).unwrap();
        let null: SalaryUpdateRequest = serde_json::from_str(r#"{"note": null}"#).unwrap();
        let text: SalaryUpdateRequest = serde_json::from_str(r#"{"note": "raise"}"#).unwrap();

        assert_eq!(absent.into_parts().unwrap().0.note, None);
        assert_eq!(null.into_parts().unwrap().0.note, Some(None));
        assert_eq!(
            text.into_parts().unwrap().0.note,
            Some(Some("raise".to_string()))
        );
    }

    #[test]
    fn test_update_request_rejects_oversized_amount() {
        let request: SalaryUpdateRequest =
            serde_json::from_str(r#"{"custom_fields": {"rsu": 1e40}}"#).unwrap();
        assert!(matches!(
            request.into_parts(),
            Err(PayrollError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_update_request_empty_custom_map_is_kept() {
        let request: SalaryUpdateRequest =
            serde_json::from_str(r#"{"custom_fields": {}}"#).unwrap();
        let (_, custom) = request.into_parts().unwrap();
        assert_eq!(custom, Some(CustomFieldMap::new()));
    }

    #[test]
    fn test_field_create_request_rejects_unknown_type() {
        let request = SalaryFieldCreateRequest {
            name: "Stock".to_string(),
            field_key: "rsu".to_string(),
            field_type: "bonus".to_string(),
            category: "bonus".to_string(),
            is_non_cash: true,
            display_order: 0,
        };
        assert!(matches!(
            NewSalaryField::try_from(request),
            Err(PayrollError::InvalidFieldType { .. })
        ));
    }

    #[test]
    fn test_field_query_parses_type() {
        let query = SalaryFieldQuery {
            field_type: Some("deduction".to_string()),
            include_inactive: true,
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.field_type, Some(FieldType::Deduction));
        assert!(filter.include_inactive);
    }
}
