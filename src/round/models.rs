use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::shared::AppError;

/// Lifecycle phase of a round, always derived from its timestamps
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoundPhase {
    /// Before start: participants may register but not tap
    Cooldown,
    /// Between start and end, both inclusive: taps are accepted
    Active,
    /// After end; terminal
    Finished,
}

impl RoundPhase {
    pub fn resolve(start_at: DateTime<Utc>, end_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start_at {
            RoundPhase::Cooldown
        } else if now <= end_at {
            RoundPhase::Active
        } else {
            RoundPhase::Finished
        }
    }
}

/// Durations used to lay out a new round on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSettings {
    pub cooldown: Duration,
    pub duration: Duration,
}

impl RoundSettings {
    pub fn new(cooldown: Duration, duration: Duration) -> Self {
        Self { cooldown, duration }
    }

    pub fn from_secs(cooldown_secs: u64, duration_secs: u64) -> Self {
        Self {
            cooldown: secs_to_duration(cooldown_secs),
            duration: secs_to_duration(duration_secs),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.cooldown <= Duration::zero() {
            return Err(AppError::Validation(
                "Cooldown duration must be positive".to_string(),
            ));
        }
        if self.duration <= Duration::zero() {
            return Err(AppError::Validation(
                "Round duration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn secs_to_duration(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Database model for rounds table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundModel {
    pub id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String, // Phase label as of the last read; never authoritative
}

impl RoundModel {
    /// Lays out a new round starting `settings.cooldown` after `now`
    pub fn new(settings: RoundSettings, now: DateTime<Utc>) -> Result<Self, AppError> {
        settings.validate()?;

        let start_at = now
            .checked_add_signed(settings.cooldown)
            .ok_or_else(|| AppError::Validation("Cooldown duration is too large".to_string()))?;
        let end_at = start_at
            .checked_add_signed(settings.duration)
            .ok_or_else(|| AppError::Validation("Round duration is too large".to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            start_at,
            end_at,
            status: RoundPhase::Cooldown.to_string(),
        })
    }

    pub fn phase(&self, now: DateTime<Utc>) -> RoundPhase {
        RoundPhase::resolve(self.start_at, self.end_at, now)
    }

    /// Rewrites the cached label; returns true if it changed
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        let label = self.phase(now).as_ref().to_string();
        if self.status == label {
            return false;
        }
        self.status = label;
        true
    }
}
