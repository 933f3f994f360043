//! Timer configuration and phase types

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACTIVITY_MINUTES, DEFAULT_REST_MINUTES, MAX_ACTIVITY_MINUTES, MAX_REST_MINUTES,
    MIN_ACTIVITY_MINUTES, MIN_REST_MINUTES,
};
use crate::{CadenceError, Result};

/// Activity and rest durations for one scheduler run.
///
/// Fields are public so that callers can express any pair; only configurations
/// that pass [`TimerConfig::validate`] ever start a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerConfig {
    pub activity_minutes: u32,
    pub rest_minutes: u32,
}

impl TimerConfig {
    /// Build a configuration, rejecting out-of-range values.
    pub fn new(activity_minutes: u32, rest_minutes: u32) -> Result<Self> {
        let config = Self { activity_minutes, rest_minutes };
        config.validate()?;
        Ok(config)
    }

    /// Check both durations against their inclusive bounds.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_ACTIVITY_MINUTES..=MAX_ACTIVITY_MINUTES).contains(&self.activity_minutes) {
            return Err(CadenceError::InvalidConfig(format!(
                "activity_minutes must be within {MIN_ACTIVITY_MINUTES}..={MAX_ACTIVITY_MINUTES}, got {}",
                self.activity_minutes
            )));
        }
        if !(MIN_REST_MINUTES..=MAX_REST_MINUTES).contains(&self.rest_minutes) {
            return Err(CadenceError::InvalidConfig(format!(
                "rest_minutes must be within {MIN_REST_MINUTES}..={MAX_REST_MINUTES}, got {}",
                self.rest_minutes
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn activity_seconds(&self) -> u64 {
        u64::from(self.activity_minutes) * 60
    }

    pub fn rest_seconds(&self) -> u64 {
        u64::from(self.rest_minutes) * 60
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { activity_minutes: DEFAULT_ACTIVITY_MINUTES, rest_minutes: DEFAULT_REST_MINUTES }
    }
}

/// Scheduler phase. `Idle` is both the initial and the terminal state of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Activity,
    Rest,
}

crate::impl_domain_status_conversions!(Phase {
    Idle => "idle",
    Activity => "activity",
    Rest => "rest",
});

impl Phase {
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}
