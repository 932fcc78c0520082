//! In-memory store with an optional JSON snapshot file.
//!
//! All tables live behind one [`RwLock`]. Each mutation holds the write lock
//! for its whole duration and works on a copy of the tables that replaces
//! the live ones only once the snapshot is saved. A failed call leaves the
//! tables untouched and readers only ever see complete units of work.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculation::{check_amount, round_currency};
use crate::error::{PayrollError, PayrollResult};
use crate::models::{
    CustomSalaryValue, FieldFilter, FixedFields, NewPerson, NewSalaryField, NewSalaryRecord,
    Person, PersonUpdate, RecordFilter, ResolvedCustomValue, SalaryField, SalaryFieldUpdate,
    SalaryRecord, SalaryRecordUpdate, User, validate_period,
};

use super::{CustomFieldMap, PayrollStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Sequences {
    user: u64,
    person: u64,
    field: u64,
    record: u64,
    value: u64,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    sequences: Sequences,
    users: BTreeMap<u64, User>,
    persons: BTreeMap<u64, Person>,
    fields: BTreeMap<u64, SalaryField>,
    records: BTreeMap<u64, SalaryRecord>,
    custom_values: BTreeMap<u64, CustomSalaryValue>,
}

impl Tables {
    fn owned_person(&self, user_id: u64, person_id: u64) -> PayrollResult<&Person> {
        self.persons
            .get(&person_id)
            .filter(|p| p.user_id == user_id)
            .ok_or(PayrollError::PersonNotFound { id: person_id })
    }

    fn owned_field(&self, user_id: u64, field_id: u64) -> PayrollResult<&SalaryField> {
        self.fields
            .get(&field_id)
            .filter(|f| f.user_id == user_id)
            .ok_or(PayrollError::FieldNotFound { id: field_id })
    }

    fn owned_record(&self, user_id: u64, record_id: u64) -> PayrollResult<&SalaryRecord> {
        self.records
            .get(&record_id)
            .filter(|r| self.owner_of_person(r.person_id) == Some(user_id))
            .ok_or(PayrollError::RecordNotFound { id: record_id })
    }

    fn owner_of_person(&self, person_id: u64) -> Option<u64> {
        self.persons.get(&person_id).map(|p| p.user_id)
    }

    fn period_taken(&self, person_id: u64, year: i32, month: u32) -> bool {
        self.records
            .values()
            .any(|r| r.person_id == person_id && r.year == year && r.month == month)
    }

    fn remove_custom_values(&mut self, record_ids: &HashSet<u64>) -> usize {
        let before = self.custom_values.len();
        self.custom_values
            .retain(|_, v| !record_ids.contains(&v.salary_record_id));
        before - self.custom_values.len()
    }

    /// Replaces all custom values of a record.
    ///
    /// Keys are resolved against the user's active definitions; unknown keys
    /// and zero amounts are skipped.
    fn replace_custom_values(
        &mut self,
        user_id: u64,
        record_id: u64,
        custom: &CustomFieldMap,
    ) -> PayrollResult<()> {
        let mut resolved = Vec::with_capacity(custom.len());
        for (field_key, amount) in custom {
            let field = self
                .fields
                .values()
                .find(|f| f.user_id == user_id && f.is_active && &f.field_key == field_key);
            match field {
                Some(field) if !amount.is_zero() => {
                    resolved.push((field.id, stored_amount(*amount)?));
                }
                Some(_) => {}
                None => debug!(record_id, field_key = %field_key, "Skipping unknown custom field"),
            }
        }

        let removed = self.remove_custom_values(&HashSet::from([record_id]));
        for (salary_field_id, amount) in resolved {
            let id = next_id(&mut self.sequences.value);
            self.custom_values.insert(
                id,
                CustomSalaryValue {
                    id,
                    salary_record_id: record_id,
                    salary_field_id,
                    amount,
                },
            );
        }
        debug!(record_id, removed, "Replaced custom values");
        Ok(())
    }
}

fn stored_amount(value: Decimal) -> PayrollResult<Decimal> {
    check_amount(round_currency(value))
}

fn stored_fixed(fixed: &FixedFields) -> PayrollResult<FixedFields> {
    Ok(FixedFields {
        base_salary: stored_amount(fixed.base_salary)?,
        performance_salary: stored_amount(fixed.performance_salary)?,
        pension_insurance: stored_amount(fixed.pension_insurance)?,
        medical_insurance: stored_amount(fixed.medical_insurance)?,
        unemployment_insurance: stored_amount(fixed.unemployment_insurance)?,
        critical_illness_insurance: stored_amount(fixed.critical_illness_insurance)?,
        enterprise_annuity: stored_amount(fixed.enterprise_annuity)?,
        housing_fund: stored_amount(fixed.housing_fund)?,
        tax: stored_amount(fixed.tax)?,
    })
}

fn storage_error(message: impl Into<String>) -> PayrollError {
    PayrollError::StorageError {
        message: message.into(),
    }
}

/// A [`PayrollStore`] that keeps every table in memory.
///
/// When opened with a data file, the full state is written to it as JSON
/// after each successful mutation and read back on the next [`open`].
///
/// [`open`]: MemoryStore::open
///
/// # Example
///
/// ```
/// use salarium::store::{MemoryStore, PayrollStore};
/// use salarium::models::NewPerson;
///
/// let store = MemoryStore::new();
/// let user = store.create_user("alice", "hash").unwrap();
/// let person = store
///     .create_person(user.id, &NewPerson { name: "Alice".to_string(), relation: None })
///     .unwrap();
/// assert_eq!(store.list_persons(user.id).unwrap(), vec![person]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    data_file: Option<PathBuf>,
}

impl MemoryStore {
    /// Creates an empty store that never touches the filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store backed by a JSON snapshot file.
    ///
    /// A missing file starts an empty store; the file is created on the
    /// first mutation.
    ///
    /// # Errors
    ///
    /// Returns [`PayrollError::StorageError`] if the file exists but cannot
    /// be read or parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> PayrollResult<Self> {
        let path = path.as_ref();
        let tables = if path.exists() {
            let content = fs::read(path)
                .map_err(|e| storage_error(format!("reading {}: {}", path.display(), e)))?;
            let tables: Tables = serde_json::from_slice(&content)
                .map_err(|e| storage_error(format!("parsing {}: {}", path.display(), e)))?;
            info!(
                path = %path.display(),
                users = tables.users.len(),
                records = tables.records.len(),
                "Loaded store snapshot"
            );
            tables
        } else {
            info!(path = %path.display(), "No store snapshot yet, starting empty");
            Tables::default()
        };

        Ok(Self {
            tables: RwLock::new(tables),
            data_file: Some(path.to_path_buf()),
        })
    }

    fn read(&self) -> PayrollResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| storage_error("store lock poisoned"))
    }

    fn write(&self) -> PayrollResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| storage_error("store lock poisoned"))
    }

    /// Runs `op` on a copy of the tables under the write lock. The copy is
    /// saved and swapped in only if both `op` and the snapshot succeed.
    fn mutate<T>(&self, op: impl FnOnce(&mut Tables) -> PayrollResult<T>) -> PayrollResult<T> {
        let mut tables = self.write()?;
        let mut draft = tables.clone();
        let result = op(&mut draft)?;
        self.persist(&draft)?;
        *tables = draft;
        Ok(result)
    }

    fn persist(&self, tables: &Tables) -> PayrollResult<()> {
        let Some(path) = &self.data_file else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(tables)
            .map_err(|e| storage_error(format!("serializing snapshot: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| storage_error(format!("creating {}: {}", parent.display(), e)))?;
        }

        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, path))
            .map_err(|e| {
                warn!(path = %path.display(), error = %e, "Failed to write store snapshot");
                storage_error(format!("writing {}: {}", path.display(), e))
            })
    }
}

impl PayrollStore for MemoryStore {
    fn create_user(&self, username: &str, password_hash: &str) -> PayrollResult<User> {
        self.mutate(|t| {
            if t.users.values().any(|u| u.username == username) {
                return Err(PayrollError::DuplicateUsername {
                    username: username.to_string(),
                });
            }
            let user = User {
                id: next_id(&mut t.sequences.user),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            };
            t.users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    fn find_user_by_username(&self, username: &str) -> PayrollResult<Option<User>> {
        let t = self.read()?;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    fn get_user(&self, user_id: u64) -> PayrollResult<Option<User>> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }

    fn create_person(&self, user_id: u64, person: &NewPerson) -> PayrollResult<Person> {
        self.mutate(|t| {
            let person = Person {
                id: next_id(&mut t.sequences.person),
                user_id,
                name: person.name.clone(),
                relation: person.relation.clone(),
                created_at: Utc::now(),
            };
            t.persons.insert(person.id, person.clone());
            Ok(person)
        })
    }

    fn list_persons(&self, user_id: u64) -> PayrollResult<Vec<Person>> {
        let t = self.read()?;
        Ok(t.persons
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    fn get_person(&self, user_id: u64, person_id: u64) -> PayrollResult<Person> {
        self.read()?.owned_person(user_id, person_id).cloned()
    }

    fn update_person(
        &self,
        user_id: u64,
        person_id: u64,
        update: &PersonUpdate,
    ) -> PayrollResult<Person> {
        self.mutate(|t| {
            t.owned_person(user_id, person_id)?;
            let person = t
                .persons
                .get_mut(&person_id)
                .ok_or(PayrollError::PersonNotFound { id: person_id })?;
            update.apply_to(person);
            Ok(person.clone())
        })
    }

    fn delete_person(&self, user_id: u64, person_id: u64) -> PayrollResult<()> {
        self.mutate(|t| {
            t.owned_person(user_id, person_id)?;
            let record_ids: HashSet<u64> = t
                .records
                .values()
                .filter(|r| r.person_id == person_id)
                .map(|r| r.id)
                .collect();
            let values = t.remove_custom_values(&record_ids);
            t.records.retain(|id, _| !record_ids.contains(id));
            t.persons.remove(&person_id);
            info!(
                person_id,
                records = record_ids.len(),
                custom_values = values,
                "Deleted person"
            );
            Ok(())
        })
    }

    fn create_field(&self, user_id: u64, field: &NewSalaryField) -> PayrollResult<SalaryField> {
        self.mutate(|t| {
            if t
                .fields
                .values()
                .any(|f| f.user_id == user_id && f.field_key == field.field_key)
            {
                return Err(PayrollError::DuplicateFieldKey {
                    field_key: field.field_key.clone(),
                });
            }
            let created = SalaryField {
                id: next_id(&mut t.sequences.field),
                user_id,
                name: field.name.clone(),
                field_key: field.field_key.clone(),
                field_type: field.field_type,
                category: field.category.clone(),
                is_non_cash: field.is_non_cash,
                display_order: field.display_order,
                is_active: true,
                created_at: Utc::now(),
            };
            t.fields.insert(created.id, created.clone());
            Ok(created)
        })
    }

    fn list_fields(&self, user_id: u64, filter: FieldFilter) -> PayrollResult<Vec<SalaryField>> {
        let t = self.read()?;
        let mut fields: Vec<SalaryField> = t
            .fields
            .values()
            .filter(|f| f.user_id == user_id && filter.matches(f))
            .cloned()
            .collect();
        fields.sort_by_key(|f| (f.display_order, f.id));
        Ok(fields)
    }

    fn get_field(&self, user_id: u64, field_id: u64) -> PayrollResult<SalaryField> {
        self.read()?.owned_field(user_id, field_id).cloned()
    }

    fn update_field(
        &self,
        user_id: u64,
        field_id: u64,
        update: &SalaryFieldUpdate,
    ) -> PayrollResult<SalaryField> {
        self.mutate(|t| {
            t.owned_field(user_id, field_id)?;
            let field = t
                .fields
                .get_mut(&field_id)
                .ok_or(PayrollError::FieldNotFound { id: field_id })?;
            update.apply_to(field);
            Ok(field.clone())
        })
    }

    fn deactivate_field(&self, user_id: u64, field_id: u64) -> PayrollResult<SalaryField> {
        let update = SalaryFieldUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        self.update_field(user_id, field_id, &update)
    }

    fn create_record(
        &self,
        user_id: u64,
        person_id: u64,
        record: &NewSalaryRecord,
        custom_fields: Option<&CustomFieldMap>,
    ) -> PayrollResult<SalaryRecord> {
        self.mutate(|t| {
            t.owned_person(user_id, person_id)?;
            validate_period(record.year, record.month)?;
            if t.period_taken(person_id, record.year, record.month) {
                return Err(PayrollError::DuplicateRecord {
                    person_id,
                    year: record.year,
                    month: record.month,
                });
            }

            let now = Utc::now();
            let created = SalaryRecord {
                id: next_id(&mut t.sequences.record),
                person_id,
                year: record.year,
                month: record.month,
                fixed: stored_fixed(&record.fixed)?,
                note: record.note.clone(),
                created_at: now,
                updated_at: now,
            };
            t.records.insert(created.id, created.clone());
            if let Some(custom) = custom_fields {
                t.replace_custom_values(user_id, created.id, custom)?;
            }
            info!(
                record_id = created.id,
                person_id,
                year = created.year,
                month = created.month,
                "Created salary record"
            );
            Ok(created)
        })
    }

    fn get_record(&self, user_id: u64, record_id: u64) -> PayrollResult<SalaryRecord> {
        self.read()?.owned_record(user_id, record_id).cloned()
    }

    fn list_records(&self, user_id: u64, filter: RecordFilter) -> PayrollResult<Vec<SalaryRecord>> {
        let t = self.read()?;
        let mut records: Vec<SalaryRecord> = t
            .records
            .values()
            .filter(|r| t.owner_of_person(r.person_id) == Some(user_id) && filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.year, r.month, r.id));
        Ok(records)
    }

    fn update_record(
        &self,
        user_id: u64,
        record_id: u64,
        update: &SalaryRecordUpdate,
        custom_fields: Option<&CustomFieldMap>,
    ) -> PayrollResult<SalaryRecord> {
        self.mutate(|t| {
            t.owned_record(user_id, record_id)?;
            let record = t
                .records
                .get_mut(&record_id)
                .ok_or(PayrollError::RecordNotFound { id: record_id })?;

            let mut fixed = record.fixed;
            update.fixed.apply_to(&mut fixed);
            record.fixed = stored_fixed(&fixed)?;
            if let Some(note) = &update.note {
                record.note = note.clone();
            }
            record.updated_at = Utc::now();
            let updated = record.clone();

            if let Some(custom) = custom_fields {
                t.replace_custom_values(user_id, record_id, custom)?;
            }
            Ok(updated)
        })
    }

    fn delete_record(&self, user_id: u64, record_id: u64) -> PayrollResult<()> {
        self.mutate(|t| {
            t.owned_record(user_id, record_id)?;
            let values = t.remove_custom_values(&HashSet::from([record_id]));
            t.records.remove(&record_id);
            info!(record_id, custom_values = values, "Deleted salary record");
            Ok(())
        })
    }

    fn custom_values_for_records(
        &self,
        record_ids: &[u64],
    ) -> PayrollResult<HashMap<u64, Vec<ResolvedCustomValue>>> {
        let t = self.read()?;
        let mut by_record: HashMap<u64, Vec<ResolvedCustomValue>> =
            record_ids.iter().map(|id| (*id, Vec::new())).collect();

        for value in t.custom_values.values() {
            let Some(resolved) = by_record.get_mut(&value.salary_record_id) else {
                continue;
            };
            match t.fields.get(&value.salary_field_id) {
                Some(field) => resolved.push(ResolvedCustomValue {
                    field: field.clone(),
                    amount: value.amount,
                }),
                None => warn!(
                    value_id = value.id,
                    field_id = value.salary_field_id,
                    "Custom value references a missing field"
                ),
            }
        }

        for values in by_record.values_mut() {
            values.sort_by_key(|v| (v.field.display_order, v.field.id));
        }
        Ok(by_record)
    }
}
