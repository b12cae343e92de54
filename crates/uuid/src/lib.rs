//! Record identifiers and sharded-path utilities.
//!
//! Rentdesk stores every record under a sharded directory derived from its identifier.
//!
//! To keep path derivation deterministic, identifiers use a *canonical* representation:
//! **32 lowercase hexadecimal characters** (no hyphens).
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Canonical form is required for externally supplied identifiers (path segments, JSON
//! bodies, query strings). Non-canonical values (uppercase, hyphenated, wrong length,
//! non-hex) are rejected rather than normalised.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, a record lives under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `rentdesk_data/tenants/55/0e/550e8400e29b41d4a716446655440000/`

mod record_id;

pub use record_id::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
