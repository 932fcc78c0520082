//! Persistence for users, persons, field definitions and salary records.
//!
//! The [`PayrollStore`] trait is the seam the HTTP layer talks to. Every
//! user-scoped read and mutation checks ownership and reports a foreign
//! row exactly like a missing one.

mod memory;

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::error::PayrollResult;
use crate::models::{
    FieldFilter, NewPerson, NewSalaryField, NewSalaryRecord, Person, PersonUpdate, RecordFilter,
    ResolvedCustomValue, SalaryField, SalaryFieldUpdate, SalaryRecord, SalaryRecordUpdate, User,
};

pub use memory::MemoryStore;

/// Custom field amounts keyed by `field_key`.
pub type CustomFieldMap = BTreeMap<String, Decimal>;

/// Storage operations needed by the payroll tracker.
///
/// Implementations must run each method as one unit of work: a concurrent
/// reader never sees a record whose custom values are half replaced.
pub trait PayrollStore: Send + Sync {
    /// Registers a user. Fails with `DuplicateUsername` if the name is taken.
    fn create_user(&self, username: &str, password_hash: &str) -> PayrollResult<User>;

    /// Looks a user up by login name.
    fn find_user_by_username(&self, username: &str) -> PayrollResult<Option<User>>;

    /// Looks a user up by id.
    fn get_user(&self, user_id: u64) -> PayrollResult<Option<User>>;

    /// Adds a family member for `user_id`.
    fn create_person(&self, user_id: u64, person: &NewPerson) -> PayrollResult<Person>;

    /// Lists the user's family members ordered by id.
    fn list_persons(&self, user_id: u64) -> PayrollResult<Vec<Person>>;

    /// Returns one of the user's family members.
    fn get_person(&self, user_id: u64, person_id: u64) -> PayrollResult<Person>;

    /// Updates one of the user's family members.
    fn update_person(
        &self,
        user_id: u64,
        person_id: u64,
        update: &PersonUpdate,
    ) -> PayrollResult<Person>;

    /// Removes a family member together with their salary records.
    fn delete_person(&self, user_id: u64, person_id: u64) -> PayrollResult<()>;

    /// Creates a field definition. Fails with `DuplicateFieldKey` when the
    /// user already has a definition with the same key.
    fn create_field(&self, user_id: u64, field: &NewSalaryField) -> PayrollResult<SalaryField>;

    /// Lists the user's field definitions ordered by `(display_order, id)`.
    fn list_fields(&self, user_id: u64, filter: FieldFilter) -> PayrollResult<Vec<SalaryField>>;

    /// Returns one of the user's field definitions.
    fn get_field(&self, user_id: u64, field_id: u64) -> PayrollResult<SalaryField>;

    /// Applies a partial update to a field definition.
    fn update_field(
        &self,
        user_id: u64,
        field_id: u64,
        update: &SalaryFieldUpdate,
    ) -> PayrollResult<SalaryField>;

    /// Soft-deletes a field definition.
    fn deactivate_field(&self, user_id: u64, field_id: u64) -> PayrollResult<SalaryField>;

    /// Creates a salary record for one of the user's persons, optionally
    /// with custom field values.
    fn create_record(
        &self,
        user_id: u64,
        person_id: u64,
        record: &NewSalaryRecord,
        custom_fields: Option<&CustomFieldMap>,
    ) -> PayrollResult<SalaryRecord>;

    /// Returns one of the user's salary records.
    fn get_record(&self, user_id: u64, record_id: u64) -> PayrollResult<SalaryRecord>;

    /// Lists the user's salary records ordered by `(year, month, id)`.
    fn list_records(&self, user_id: u64, filter: RecordFilter) -> PayrollResult<Vec<SalaryRecord>>;

    /// Applies a partial update to a salary record. When `custom_fields` is
    /// given, the record's custom values are replaced by it.
    fn update_record(
        &self,
        user_id: u64,
        record_id: u64,
        update: &SalaryRecordUpdate,
        custom_fields: Option<&CustomFieldMap>,
    ) -> PayrollResult<SalaryRecord>;

    /// Deletes a salary record and its custom values.
    fn delete_record(&self, user_id: u64, record_id: u64) -> PayrollResult<()>;

    /// Loads the custom values of many records in one pass, each joined with
    /// its field definition. Records without values map to an empty list.
    fn custom_values_for_records(
        &self,
        record_ids: &[u64],
    ) -> PayrollResult<HashMap<u64, Vec<ResolvedCustomValue>>>;
}
