//! # Configuration State
//!
//! Read-only service configuration plus the business date used by
//! commands that need "today".

use chrono::{Local, NaiveDate};
use std::sync::Arc;

use crate::config::ServiceConfig;
use cuota_core::CheckoutConfig;

/// Shared, read-only configuration.
#[derive(Debug, Clone)]
pub struct ConfigState {
    config: Arc<ServiceConfig>,

    /// Fixed business date. The local calendar date when unset.
    pinned_today: Option<NaiveDate>,
}

impl ConfigState {
    pub fn new(config: ServiceConfig) -> Self {
        ConfigState {
            config: Arc::new(config),
            pinned_today: None,
        }
    }

    /// Pins the business date (back-dated runs, tests).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.pinned_today = Some(today);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn checkout(&self) -> &CheckoutConfig {
        &self.config.checkout
    }

    /// The business date in the store's local timezone.
    pub fn today(&self) -> NaiveDate {
        self.pinned_today
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState::new(ServiceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_today() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let state = ConfigState::default().with_today(day);
        assert_eq!(state.today(), day);
        assert_eq!(state.checkout().tax_rate.bps(), 825);
    }
}
