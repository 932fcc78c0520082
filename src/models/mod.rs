//! Core data models for the payroll tracker.
//!
//! This module contains the domain models shared by the store, the
//! calculation routines and the HTTP layer.

mod person;
mod salary_field;
mod salary_record;

pub use person::{NewPerson, Person, PersonUpdate, User};
pub use salary_field::{
    CustomSalaryValue, FieldFilter, FieldType, NewSalaryField, ResolvedCustomValue, SalaryField,
    SalaryFieldUpdate,
};
pub use salary_record::{
    FixedFields, FixedFieldsPatch, MAX_YEAR, MIN_YEAR, NewSalaryRecord, RecordFilter,
    SalaryRecord, SalaryRecordUpdate, validate_period,
};
