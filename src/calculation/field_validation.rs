//! Field definition validation.
//!
//! Checks that a custom field's category belongs to the category list
//! configured for its field type.

use crate::config::CategoryTable;
use crate::error::{PayrollError, PayrollResult};
use crate::models::{FieldType, NewSalaryField, SalaryField, SalaryFieldUpdate};

/// Validates that `category` is allowed for `field_type`.
///
/// # Errors
///
/// Returns [`PayrollError::InvalidCategory`] listing the allowed keys when
/// the category is not in the table for this field type.
///
/// # Examples
///
/// ```
/// use salarium::calculation::validate_category;
/// use salarium::config::CategoryTable;
/// use salarium::models::FieldType;
///
/// let table = CategoryTable::default();
/// assert!(validate_category(&table, FieldType::Income, "bonus").is_ok());
/// assert!(validate_category(&table, FieldType::Deduction, "bonus").is_err());
/// ```
pub fn validate_category(
    table: &CategoryTable,
    field_type: FieldType,
    category: &str,
) -> PayrollResult<()> {
    if table.contains(field_type, category) {
        Ok(())
    } else {
        Err(PayrollError::InvalidCategory {
            field_type: field_type.to_string(),
            category: category.to_string(),
            valid: table.keys_for(field_type),
        })
    }
}

/// Validates a field definition before it is created.
pub fn validate_new_field(table: &CategoryTable, field: &NewSalaryField) -> PayrollResult<()> {
    validate_category(table, field.field_type, &field.category)
}

/// Validates an update against the existing definition's field type.
pub fn validate_field_update(
    table: &CategoryTable,
    existing: &SalaryField,
    update: &SalaryFieldUpdate,
) -> PayrollResult<()> {
    match &update.category {
        Some(category) => validate_category(table, existing.field_type, category),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_field(field_type: FieldType, category: &str) -> NewSalaryField {
        NewSalaryField {
            name: "Test".to_string(),
            field_key: "test".to_string(),
            field_type,
            category: category.to_string(),
            is_non_cash: false,
            display_order: 0,
        }
    }

    #[test]
    fn test_every_default_income_category_is_valid() {
        let table = CategoryTable::default();
        for key in [
            "base_salary",
            "performance",
            "allowance",
            "bonus",
            "welfare",
            "other_income",
        ] {
            assert!(validate_category(&table, FieldType::Income, key).is_ok(), "{key}");
        }
    }

    #[test]
    fn test_every_default_deduction_category_is_valid() {
        let table = CategoryTable::default();
        for key in ["insurance", "housing_fund", "tax", "other_deduction"] {
            assert!(
                validate_category(&table, FieldType::Deduction, key).is_ok(),
                "{key}"
            );
        }
    }

    #[test]
    fn test_category_of_other_type_is_rejected() {
        let table = CategoryTable::default();
        let result = validate_new_field(&table, &new_field(FieldType::Income, "insurance"));

        match result {
            Err(PayrollError::InvalidCategory {
                field_type,
                category,
                valid,
            }) => {
                assert_eq!(field_type, "income");
                assert_eq!(category, "insurance");
                assert_eq!(valid.len(), 6);
                assert!(valid.contains(&"bonus".to_string()));
            }
            other => panic!("Expected InvalidCategory, got {:?}", other),
        }
    }

    #[test]
    fn test_update_checks_category_against_existing_type() {
        let table = CategoryTable::default();
        let existing = SalaryField {
            id: 1,
            user_id: 1,
            name: "Union fee".to_string(),
            field_key: "union_fee".to_string(),
            field_type: FieldType::Deduction,
            category: "other_deduction".to_string(),
            is_non_cash: false,
            display_order: 0,
            is_active: true,
            created_at: Utc::now(),
        };

        let to_income_category = SalaryFieldUpdate {
            category: Some("bonus".to_string()),
            ..Default::default()
        };
        let to_deduction_category = SalaryFieldUpdate {
            category: Some("insurance".to_string()),
            ..Default::default()
        };

        assert!(validate_field_update(&table, &existing, &to_income_category).is_err());
        assert!(validate_field_update(&table, &existing, &to_deduction_category).is_ok());
        assert!(validate_field_update(&table, &existing, &SalaryFieldUpdate::default()).is_ok());
    }
}
