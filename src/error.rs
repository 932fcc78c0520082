//! Error types for the payroll tracker.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the aggregator, the store, the authentication layer
//! and the configuration loader can report.

use thiserror::Error;

/// The main error type for the payroll tracker.
///
/// All fallible operations in the crate return this error type, so the HTTP
/// layer can map each kind to a status code in one place.
///
/// # Example
///
/// ```
/// use salarium::error::PayrollError;
///
/// let error = PayrollError::InvalidAmount {
///     value: "12,5".to_string(),
///     message: "Invalid decimal: unknown character".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid amount '12,5': Invalid decimal: unknown character"
/// );
/// ```
#[derive(Debug, Error)]
pub enum PayrollError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A monetary input could not be coerced to an exact decimal.
    #[error("Invalid amount '{value}': {message}")]
    InvalidAmount {
        /// The raw input that failed to parse.
        value: String,
        /// A description of the parse failure.
        message: String,
    },

    /// A field type tag was neither `income` nor `deduction`.
    #[error("Invalid field type '{value}': expected 'income' or 'deduction'")]
    InvalidFieldType {
        /// The rejected type tag.
        value: String,
    },

    /// A category does not belong to the set allowed for the field's type.
    #[error("Invalid category '{category}' for {field_type} field, valid categories: {valid:?}")]
    InvalidCategory {
        /// The field type the category was checked against.
        field_type: String,
        /// The rejected category key.
        category: String,
        /// The category keys that are allowed for this field type.
        valid: Vec<String>,
    },

    /// A field definition with the same key already exists for the user.
    #[error("Field key '{field_key}' already exists")]
    DuplicateFieldKey {
        /// The colliding field key.
        field_key: String,
    },

    /// The year or month of a salary record is out of range.
    #[error("Invalid salary period {year}-{month:02}")]
    InvalidPeriod {
        /// The requested year.
        year: i32,
        /// The requested month.
        month: u32,
    },

    /// A salary record already exists for this person and month.
    #[error("Salary record for person {person_id} in {year}-{month:02} already exists")]
    DuplicateRecord {
        /// The person the record belongs to.
        person_id: u64,
        /// The record's year.
        year: i32,
        /// The record's month.
        month: u32,
    },

    /// The salary record does not exist or belongs to another user.
    #[error("Salary record not found: {id}")]
    RecordNotFound {
        /// The requested record id.
        id: u64,
    },

    /// The field definition does not exist or belongs to another user.
    #[error("Salary field not found: {id}")]
    FieldNotFound {
        /// The requested field id.
        id: u64,
    },

    /// The person does not exist or belongs to another user.
    #[error("Person not found: {id}")]
    PersonNotFound {
        /// The requested person id.
        id: u64,
    },

    /// The username is already registered.
    #[error("Username '{username}' is already taken")]
    DuplicateUsername {
        /// The colliding username.
        username: String,
    },

    /// Login failed because the username or password is wrong.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    /// The bearer credential is missing, invalid or expired.
    #[error("Could not validate credentials: {message}")]
    Unauthenticated {
        /// Why the credential was rejected.
        message: String,
    },

    /// The persistence layer failed.
    #[error("Storage error: {message}")]
    StorageError {
        /// A description of the storage failure.
        message: String,
    },

    /// An unexpected failure outside the store, such as token signing.
    #[error("Internal error: {message}")]
    Internal {
        /// A description of the failure.
        message: String,
    },
}

/// A type alias for Results that return PayrollError.
pub type PayrollResult<T> = Result<T, PayrollError>;
