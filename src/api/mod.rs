//! HTTP API module for the payroll tracker.
//!
//! This module provides the REST endpoints for accounts, family members,
//! custom field definitions, salary records and the stateless payroll
//! calculation.

mod extract;
mod handlers;
mod request;
mod response;
mod state;

pub use extract::AuthUser;
pub use handlers::create_router;
pub use request::{
    CredentialsRequest, SalaryCreateRequest, SalaryFieldCreateRequest, SalaryFieldQuery,
    SalaryUpdateRequest, YearlyStatsQuery,
};
pub use response::{ApiError, ApiErrorResponse, OkResponse, SalaryOut, TokenResponse, UserOut};
pub use state::AppState;
