use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::slots::TimeSlot;
use crate::calendar::solar_time::{true_solar_time, SolarTimeResult, DEFAULT_LONGITUDE};
use crate::error::CalendarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CalendarKind {
    #[default]
    Solar,
    Lunar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "男")]
    Male,
    #[serde(rename = "女")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "男",
            Gender::Female => "女",
        }
    }

    /// Accepts the Chinese characters as well as `male`/`female`/`m`/`f`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "男" | "male" | "m" => Some(Gender::Male),
            "女" | "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Birth data as submitted by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthInput {
    pub calendar: CalendarKind,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Leap month flag; only meaningful for lunar dates.
    #[serde(default)]
    pub is_leap: bool,
    pub hour: u32,
    pub minute: u32,
    pub gender: Gender,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// Explicit slot selection. Required for lunar input, overrides the
    /// solar-time result otherwise.
    #[serde(default)]
    pub hour_slot: Option<u8>,
}

fn default_longitude() -> f64 {
    DEFAULT_LONGITUDE
}

impl BirthInput {
    pub fn solar(year: i32, month: u32, day: u32, hour: u32, minute: u32, gender: Gender) -> Self {
        Self {
            calendar: CalendarKind::Solar,
            year,
            month,
            day,
            is_leap: false,
            hour,
            minute,
            gender,
            longitude: DEFAULT_LONGITUDE,
            hour_slot: None,
        }
    }

    pub fn lunar(year: i32, month: u32, day: u32, is_leap: bool, slot: u8, gender: Gender) -> Self {
        Self {
            calendar: CalendarKind::Lunar,
            year,
            month,
            day,
            is_leap,
            hour: 0,
            minute: 0,
            gender,
            longitude: DEFAULT_LONGITUDE,
            hour_slot: Some(slot),
        }
    }

    pub fn with_longitude(mut self, longitude: f64) -> Self {
        self.longitude = longitude;
        self
    }

    pub fn is_lunar(&self) -> bool {
        self.calendar == CalendarKind::Lunar
    }

    /// Date in the chart service's `YYYY-M-D` form (no zero padding).
    pub fn birthday(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }

    /// Resolve clock time to true solar time, or carry the chosen slot for
    /// lunar dates.
    pub fn resolve_time(&self) -> Result<SolarTimeResult, CalendarError> {
        match self.calendar {
            CalendarKind::Solar => {
                let mut result = true_solar_time(
                    self.year,
                    self.month,
                    self.day,
                    self.hour,
                    self.minute,
                    self.longitude,
                )?;
                if let Some(index) = self.hour_slot {
                    let slot = TimeSlot::from_index(index)?;
                    result.chinese_hour = slot.name().to_string();
                    result.chinese_hour_index = slot.index();
                }
                Ok(result)
            }
            CalendarKind::Lunar => {
                let index = self.hour_slot.ok_or(CalendarError::MissingSlot)?;
                let slot = TimeSlot::from_index(index)?;
                Ok(SolarTimeResult::for_lunar(&self.birthday(), slot, self.longitude))
            }
        }
    }

    /// Slot index sent to the chart service.
    pub fn hour_index(&self) -> Result<u8, CalendarError> {
        self.resolve_time().map(|r| r.chinese_hour_index)
    }
}
