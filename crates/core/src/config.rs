//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_INVOICE_DUE_DAY, DEFAULT_INVOICE_GENERATION_DAY,
    DEFAULT_INVOICE_PREFIX, MAX_BILLING_DAY,
};
use crate::{RentalError, RentalResult};
use rentdesk_types::NonEmptyText;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    invoice_due_day: u32,
    invoice_generation_day: u32,
    invoice_prefix: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::InvalidInput`] if a billing day is outside `1..=28` or the
    /// invoice prefix is not a short run of ASCII letters, digits or `-`.
    pub fn new(
        data_dir: PathBuf,
        invoice_due_day: u32,
        invoice_generation_day: u32,
        invoice_prefix: &str,
    ) -> RentalResult<Self> {
        validate_billing_day("invoice due day", invoice_due_day)?;
        validate_billing_day("invoice generation day", invoice_generation_day)?;

        let invoice_prefix = NonEmptyText::new(invoice_prefix)
            .map_err(|_| RentalError::InvalidInput("invoice prefix cannot be empty".into()))?;
        let prefix_ok = invoice_prefix.as_str().len() <= 12
            && invoice_prefix
                .as_str()
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !prefix_ok {
            return Err(RentalError::InvalidInput(
                "invoice prefix must be at most 12 characters of A-Z, 0-9 or '-'".into(),
            ));
        }

        Ok(Self {
            data_dir,
            invoice_due_day,
            invoice_generation_day,
            invoice_prefix: invoice_prefix.as_str().to_owned(),
        })
    }

    /// Resolve configuration from the process environment.
    ///
    /// Reads `RENTDESK_DATA_DIR`, `RENTDESK_INVOICE_DUE_DAY`,
    /// `RENTDESK_INVOICE_GENERATION_DAY` and `RENTDESK_INVOICE_PREFIX`, falling back to the
    /// defaults in [`crate::constants`]. Call once at startup.
    pub fn from_env() -> RentalResult<Self> {
        let data_dir = std::env::var("RENTDESK_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.into());
        let due_day = billing_day_from_env_value(
            std::env::var("RENTDESK_INVOICE_DUE_DAY").ok(),
            DEFAULT_INVOICE_DUE_DAY,
        )?;
        let generation_day = billing_day_from_env_value(
            std::env::var("RENTDESK_INVOICE_GENERATION_DAY").ok(),
            DEFAULT_INVOICE_GENERATION_DAY,
        )?;
        let prefix = std::env::var("RENTDESK_INVOICE_PREFIX")
            .unwrap_or_else(|_| DEFAULT_INVOICE_PREFIX.into());

        Self::new(PathBuf::from(data_dir), due_day, generation_day, &prefix)
    }

    /// Configuration with default billing settings, rooted at `data_dir`.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            invoice_due_day: DEFAULT_INVOICE_DUE_DAY,
            invoice_generation_day: DEFAULT_INVOICE_GENERATION_DAY,
            invoice_prefix: DEFAULT_INVOICE_PREFIX.to_owned(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn invoice_due_day(&self) -> u32 {
        self.invoice_due_day
    }

    pub fn invoice_generation_day(&self) -> u32 {
        self.invoice_generation_day
    }

    pub fn invoice_prefix(&self) -> &str {
        &self.invoice_prefix
    }
}

fn validate_billing_day(name: &str, day: u32) -> RentalResult<()> {
    if (1..=MAX_BILLING_DAY).contains(&day) {
        Ok(())
    } else {
        Err(RentalError::InvalidInput(format!(
            "{name} must be between 1 and {MAX_BILLING_DAY}, got {day}"
        )))
    }
}

/// Parse an optional billing-day value (e.g. from an environment variable).
///
/// `None` or blank input yields `default`.
pub fn billing_day_from_env_value(value: Option<String>, default: u32) -> RentalResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        None => Ok(default),
        Some(v) => v
            .parse::<u32>()
            .map_err(|_| RentalError::InvalidInput(format!("not a day of the month: '{v}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_days_outside_every_month() {
        let dir = PathBuf::from("data");
        assert!(CoreConfig::new(dir.clone(), 0, 1, "INV").is_err());
        assert!(CoreConfig::new(dir.clone(), 29, 1, "INV").is_err());
        assert!(CoreConfig::new(dir.clone(), 5, 31, "INV").is_err());
        assert!(CoreConfig::new(dir, 28, 28, "INV").is_ok());
    }

    #[test]
    fn rejects_unsafe_prefixes() {
        let dir = PathBuf::from("data");
        assert!(CoreConfig::new(dir.clone(), 5, 1, "  ").is_err());
        assert!(CoreConfig::new(dir.clone(), 5, 1, "INV/../").is_err());
        assert!(CoreConfig::new(dir.clone(), 5, 1, "A-VERY-LONG-PREFIX").is_err());
        assert_eq!(
            CoreConfig::new(dir, 5, 1, "RENT-1").unwrap().invoice_prefix(),
            "RENT-1"
        );
    }

    #[test]
    fn billing_day_env_value_defaults_when_blank() {
        assert_eq!(billing_day_from_env_value(None, 5).unwrap(), 5);
        assert_eq!(billing_day_from_env_value(Some(" ".into()), 5).unwrap(), 5);
        assert_eq!(billing_day_from_env_value(Some("10".into()), 5).unwrap(), 10);
        assert!(billing_day_from_env_value(Some("tenth".into()), 5).is_err());
    }
}
