//! # API Shared
//!
//! Shared utilities and definitions for Rentdesk front ends.
//!
//! Contains:
//! - Shared services like `HealthService`
//! - Bearer-token authentication (usable by any HTTP front end)
//! - The JSON error body returned by every failing request
//!
//! Used by `api-rest` and the `rentdesk-run` binary.

pub mod auth;
pub mod error;
pub mod health;

pub use auth::{ApiTokens, AuthError};
pub use error::ErrorBody;
pub use health::{HealthRes, HealthService};
