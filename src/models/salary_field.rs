//! Salary field definition model and related types.
//!
//! This module defines the user-defined custom field definitions
//! ([`SalaryField`]), the [`FieldType`] tag that splits them into income and
//! deduction fields, and the per-record [`CustomSalaryValue`] join rows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PayrollError;

/// Whether a custom field adds to income or is deducted from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Counted towards total income.
    Income,
    /// Counted towards total deductions.
    Deduction,
}

impl FieldType {
    /// Returns the wire tag for this field type.
    ///
    /// # Examples
    ///
    /// ```
    /// use salarium::models::FieldType;
    ///
    /// assert_eq!(FieldType::Income.as_str(), "income");
    /// assert_eq!(FieldType::Deduction.as_str(), "deduction");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Income => "income",
            FieldType::Deduction => "deduction",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = PayrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(FieldType::Income),
            "deduction" => Ok(FieldType::Deduction),
            other => Err(PayrollError::InvalidFieldType {
                value: other.to_string(),
            }),
        }
    }
}

/// A user-scoped custom salary field definition.
///
/// The `(user_id, field_key)` pair is unique. Definitions are never removed;
/// deleting one clears `is_active` so historical values stay resolvable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryField {
    /// Unique identifier of the definition.
    pub id: u64,
    /// The user who owns this definition.
    pub user_id: u64,
    /// Display name, e.g. "Spring festival bonus".
    pub name: String,
    /// Stable key used in custom field maps, e.g. "spring_bonus".
    pub field_key: String,
    /// Income or deduction.
    pub field_type: FieldType,
    /// Category key drawn from the table for `field_type`.
    pub category: String,
    /// Non-cash income is excluded from actual take-home.
    pub is_non_cash: bool,
    /// Sort order for listings.
    pub display_order: i32,
    /// Soft-delete flag.
    pub is_active: bool,
    /// When the definition was created.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSalaryField {
    /// Display name.
    pub name: String,
    /// Unique key per user.
    pub field_key: String,
    /// Income or deduction.
    pub field_type: FieldType,
    /// Category key.
    pub category: String,
    /// Whether the field is a non-cash benefit.
    #[serde(default)]
    pub is_non_cash: bool,
    /// Sort order for listings.
    #[serde(default)]
    pub display_order: i32,
}

/// Partial update of a field definition.
///
/// The key and type of a definition are fixed once created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryFieldUpdate {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New category key, validated against the existing field type.
    #[serde(default)]
    pub category: Option<String>,
    /// New non-cash flag.
    #[serde(default)]
    pub is_non_cash: Option<bool>,
    /// New sort order.
    #[serde(default)]
    pub display_order: Option<i32>,
    /// Re-activate or deactivate the definition.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl SalaryFieldUpdate {
    /// Applies the provided values onto `field`, leaving the rest untouched.
    pub fn apply_to(&self, field: &mut SalaryField) {
        if let Some(name) = &self.name {
            field.name = name.clone();
        }
        if let Some(category) = &self.category {
            field.category = category.clone();
        }
        if let Some(is_non_cash) = self.is_non_cash {
            field.is_non_cash = is_non_cash;
        }
        if let Some(display_order) = self.display_order {
            field.display_order = display_order;
        }
        if let Some(is_active) = self.is_active {
            field.is_active = is_active;
        }
    }
}

/// Filter for listing field definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// Only return fields of this type.
    #[serde(default)]
    pub field_type: Option<FieldType>,
    /// Include soft-deleted fields.
    #[serde(default)]
    pub include_inactive: bool,
}

impl FieldFilter {
    /// Returns true if `field` passes this filter.
    pub fn matches(&self, field: &SalaryField) -> bool {
        self.field_type.is_none_or(|t| t == field.field_type)
            && (self.include_inactive || field.is_active)
    }
}

/// A custom field amount attached to one salary record.
///
/// Unique per `(salary_record_id, salary_field_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSalaryValue {
    /// Unique identifier of the value row.
    pub id: u64,
    /// The salary record this value belongs to.
    pub salary_record_id: u64,
    /// The definition this value is resolved through.
    pub salary_field_id: u64,
    /// The amount, stored with 2 decimal places.
    pub amount: Decimal,
}

/// A custom value joined with its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCustomValue {
    /// The field definition.
    pub field: SalaryField,
    /// The amount recorded for this field.
    pub amount: Decimal,
}
