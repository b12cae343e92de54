//! Constants used throughout the Rentdesk core crate.
//!
//! Directory names, file names and defaults live here so storage layout and
//! configuration stay consistent across services, the CLI and the REST API.

/// Default directory for record storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "rentdesk_data";

/// Filename holding a single record inside its sharded directory.
pub const RECORD_FILENAME: &str = "record.json";

/// Temporary filename used while a record is being written.
pub const RECORD_TMP_FILENAME: &str = "record.json.tmp";

/// Default day of the month rent invoices fall due.
pub const DEFAULT_INVOICE_DUE_DAY: u32 = 5;

/// Default day of the month the scheduler generates rent invoices.
pub const DEFAULT_INVOICE_GENERATION_DAY: u32 = 1;

/// Default invoice number prefix.
pub const DEFAULT_INVOICE_PREFIX: &str = "INV";

/// Latest day of the month accepted for due/generation days, so every month has it.
pub const MAX_BILLING_DAY: u32 = 28;

/// Default number of items per page for list endpoints.
pub const DEFAULT_PER_PAGE: u32 = 25;

/// Largest page size a list endpoint will return.
pub const MAX_PER_PAGE: u32 = 100;

/// Minimum accepted password length for users.
pub const MIN_PASSWORD_LEN: usize = 8;
