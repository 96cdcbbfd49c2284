//! Schedule presets offered by the job form.
//!
//! Schedules are stored as opaque cron strings; nothing in this service executes
//! them. Presets only build the string.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(tag = "preset", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulePreset {
    Hourly,
    Daily {
        hour: u8,
    },
    /// `day` is 0 (Sunday) through 6 (Saturday)
    Weekly {
        day: u8,
        hour: u8,
    },
    /// `day` is limited to 1-28 so every month has it
    Monthly {
        day: u8,
        hour: u8,
    },
    Custom {
        expression: String,
    },
}

impl SchedulePreset {
    pub fn to_cron(&self) -> DomainResult<String> {
        match self {
            Self::Hourly => Ok("0 * * * *".to_string()),
            Self::Daily { hour } => {
                check_hour(*hour)?;
                Ok(format!("0 {hour} * * *"))
            }
            Self::Weekly { day, hour } => {
                check_hour(*hour)?;
                if *day > 6 {
                    return Err(DomainError::invalid_field(
                        "schedule",
                        format!("weekday must be between 0 and 6, got {day}"),
                    ));
                }
                Ok(format!("0 {hour} * * {day}"))
            }
            Self::Monthly { day, hour } => {
                check_hour(*hour)?;
                if !(1..=28).contains(day) {
                    return Err(DomainError::invalid_field(
                        "schedule",
                        format!("day of month must be between 1 and 28, got {day}"),
                    ));
                }
                Ok(format!("0 {hour} {day} * *"))
            }
            Self::Custom { expression } => {
                let expression = expression.trim();
                if expression.is_empty() {
                    return Err(DomainError::invalid_field(
                        "schedule",
                        "custom cron expression must not be empty",
                    ));
                }
                Ok(expression.to_string())
            }
        }
    }
}

fn check_hour(hour: u8) -> DomainResult<()> {
    if hour > 23 {
        return Err(DomainError::invalid_field(
            "schedule",
            format!("hour must be between 0 and 23, got {hour}"),
        ));
    }
    Ok(())
}
