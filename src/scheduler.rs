//! Hourly background run of the monthly rent-invoice generation.
//!
//! Generation is idempotent per unit and period, so waking every hour and generating whenever
//! the generation day has been reached only fills gaps: units that became occupied since the
//! last run get their invoice, everything else is skipped. A rent invoice cancelled for the
//! period is not reissued.

use chrono::{Datelike, NaiveDate};
use rentdesk_core::services::{InvoiceService, today};
use rentdesk_core::{BillingPeriod, CoreConfig, Store};
use std::sync::Arc;
use std::time::Duration;

const TICK: Duration = Duration::from_secs(60 * 60);

/// `RENTDESK_SCHEDULER` is on unless set to `false`, `0`, `no` or `off`.
pub fn enabled_from_env_value(value: Option<String>) -> bool {
    match value.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off"),
    }
}

/// The period to generate for on `today`, or `None` before the generation day.
pub fn due_period(today: NaiveDate, generation_day: u32) -> Option<BillingPeriod> {
    (today.day() >= generation_day).then(|| BillingPeriod::containing(today))
}

pub async fn run(cfg: Arc<CoreConfig>, store: Arc<Store>) {
    let mut interval = tokio::time::interval(TICK);
    loop {
        interval.tick().await;

        let Some(period) = due_period(today(), cfg.invoice_generation_day()) else {
            continue;
        };
        let service = InvoiceService::new(cfg.clone(), store.clone());
        match tokio::task::spawn_blocking(move || service.generate_scheduled(period)).await {
            Ok(Ok(report)) if !report.generated.is_empty() => tracing::info!(
                period = %report.period,
                generated = report.generated.len(),
                skipped = report.skipped.len(),
                "scheduled invoice run"
            ),
            Ok(Ok(_)) => tracing::debug!(period = %period, "scheduled invoice run: nothing to do"),
            Ok(Err(e)) => tracing::error!("Scheduled invoice run failed: {:?}", e),
            Err(e) => tracing::error!("Scheduled invoice task panicked: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_is_on_by_default() {
        assert!(enabled_from_env_value(None));
        assert!(enabled_from_env_value(Some(" ".into())));
        assert!(enabled_from_env_value(Some("true".into())));
        assert!(!enabled_from_env_value(Some("Off".into())));
        assert!(!enabled_from_env_value(Some("0".into())));
    }

    #[test]
    fn waits_for_the_generation_day() {
        let day = |d| NaiveDate::from_ymd_opt(2026, 10, d).unwrap();
        assert_eq!(due_period(day(4), 5), None);
        assert_eq!(
            due_period(day(5), 5),
            Some(BillingPeriod::containing(day(1)))
        );
        assert!(due_period(day(28), 1).is_some());
    }
}
