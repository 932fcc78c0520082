//! Person and user models.
//!
//! A [`User`] is an account that logs in; a [`Person`] is a family member
//! whose salary the user tracks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account that owns persons and field definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier of the user.
    pub id: u64,
    /// Unique login name.
    pub username: String,
    /// Argon2 PHC hash of the password.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A family member whose monthly salary is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Unique identifier of the person.
    pub id: u64,
    /// The user who tracks this person.
    pub user_id: u64,
    /// Display name.
    pub name: String,
    /// Relation to the user, e.g. "self" or "spouse".
    pub relation: Option<String>,
    /// When the person was added.
    pub created_at: DateTime<Utc>,
}

/// Input for adding a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    /// Display name.
    pub name: String,
    /// Relation to the user.
    #[serde(default)]
    pub relation: Option<String>,
}

/// Partial update of a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonUpdate {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New relation.
    #[serde(default)]
    pub relation: Option<String>,
}

impl PersonUpdate {
    /// Applies the provided values onto `person`.
    pub fn apply_to(&self, person: &mut Person) {
        if let Some(name) = &self.name {
            person.name = name.clone();
        }
        if let Some(relation) = &self.relation {
            person.relation = Some(relation.clone());
        }
    }
}
