//! Input validation utilities.
//!
//! Request payloads arrive as loosely typed input structs. Each service runs the payload
//! through a [`ValidationErrors`] collector, which turns raw strings into the validated types
//! from `rentdesk-types` and records a message per failing field. All problems are reported
//! at once, keyed by field name, rather than failing on the first one.

use crate::{RentalError, RentalResult};
use chrono::NaiveDate;
use rentdesk_types::{CurrencyCode, EmailAddress, NonEmptyText};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Longest free-text value accepted for names, titles, codes and similar short fields.
pub const MAX_SHORT_TEXT: usize = 255;

/// Longest free-text value accepted for descriptions and notes.
pub const MAX_LONG_TEXT: usize = 5_000;

/// Field-keyed validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    /// Fold another collector's messages into this one.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` if nothing was recorded, otherwise [`RentalError::Validation`].
    pub fn finish(self) -> RentalResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RentalError::Validation(self))
        }
    }

    /// A required short text field.
    pub fn required_text(&mut self, field: &str, value: &str) -> Option<NonEmptyText> {
        match NonEmptyText::new(value) {
            Ok(text) if text.as_str().chars().count() > MAX_SHORT_TEXT => {
                self.add(
                    field,
                    format!("The {field} may not be greater than {MAX_SHORT_TEXT} characters."),
                );
                None
            }
            Ok(text) => Some(text),
            Err(_) => {
                self.add(field, format!("The {field} field is required."));
                None
            }
        }
    }

    /// An optional text field. Blank input is treated as absent.
    pub fn optional_text(
        &mut self,
        field: &str,
        value: Option<&str>,
        max_len: usize,
    ) -> Option<String> {
        let trimmed = value.map(str::trim).filter(|v| !v.is_empty())?;
        if trimmed.chars().count() > max_len {
            self.add(
                field,
                format!("The {field} may not be greater than {max_len} characters."),
            );
            return None;
        }
        Some(trimmed.to_owned())
    }

    pub fn email(&mut self, field: &str, value: &str) -> Option<EmailAddress> {
        if value.trim().is_empty() {
            self.add(field, format!("The {field} field is required."));
            return None;
        }
        match EmailAddress::parse(value) {
            Ok(email) => Some(email),
            Err(_) => {
                self.add(field, format!("The {field} must be a valid email address."));
                None
            }
        }
    }

    pub fn currency_code(&mut self, field: &str, value: &str) -> Option<CurrencyCode> {
        match CurrencyCode::parse(value) {
            Ok(code) => Some(code),
            Err(_) => {
                self.add(field, format!("The {field} must be a three-letter code."));
                None
            }
        }
    }

    pub fn positive_amount(&mut self, field: &str, value: Decimal) -> Option<Decimal> {
        if value <= Decimal::ZERO {
            self.add(field, format!("The {field} must be greater than 0."));
            return None;
        }
        Some(value)
    }

    pub fn non_negative_amount(&mut self, field: &str, value: Decimal) -> Option<Decimal> {
        if value < Decimal::ZERO {
            self.add(field, format!("The {field} must be at least 0."));
            return None;
        }
        Some(value)
    }

    /// Records an error on `end_field` when both dates are present and `end` precedes `start`.
    pub fn date_order(
        &mut self,
        start_field: &str,
        start: Option<NaiveDate>,
        end_field: &str,
        end: Option<NaiveDate>,
    ) {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                self.add(
                    end_field,
                    format!("The {end_field} must be a date after or equal to {start_field}."),
                );
            }
        }
    }

    /// Records an error when `value` is longer than `max` characters.
    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(
                field,
                format!("The {field} may not be greater than {max} characters."),
            );
        }
    }

    /// Records an error on `field` when `condition` is false.
    pub fn check(&mut self, condition: bool, field: &str, message: impl Into<String>) {
        if !condition {
            self.add(field, message);
        }
    }
}
