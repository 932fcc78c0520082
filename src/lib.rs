//! Family payroll tracker.
//!
//! This crate records monthly salary components for the members of a
//! household and derives gross income, deductions, net income and cash
//! take-home from them with exact decimal arithmetic.

#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
