//! Authentication primitives.
//!
//! Passwords are stored as Argon2 hashes and sessions are carried by
//! HS256-signed bearer tokens.

mod jwt;
mod password;

pub use jwt::{Claims, TOKEN_TYPE, issue_token, verify_token};
pub use password::{hash_password, verify_password};
