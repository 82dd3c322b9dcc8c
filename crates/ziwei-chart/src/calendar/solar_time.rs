//! True solar time correction.
//!
//! Clock time is shifted by a two-harmonic equation-of-time approximation and
//! by the observer's offset from the 120°E standard meridian (UTC+8), then
//! mapped onto the traditional two-hour slots.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::calendar::slots::{classify, TimeSlot};
use crate::error::CalendarError;

/// Standard meridian of China Standard Time.
pub const REFERENCE_MERIDIAN: f64 = 120.0;
/// Longitude used when the user gives none (Shanghai).
pub const DEFAULT_LONGITUDE: f64 = 120.033;
/// Minutes of clock time per degree of longitude.
pub const MINUTES_PER_DEGREE: f64 = 4.0;

const MINUTES_PER_DAY: f64 = 1440.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
// 2000-01-01 counted from 0001-01-01 as day 1.
const EPOCH_DAYS_FROM_CE: i32 = 730_120;
// The epoch sits at noon.
const EPOCH_SECONDS_INTO_DAY: f64 = 43_200.0;

/// Intermediate terms of the correction, kept for inspection and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarCorrection {
    /// Fractional days since 2000-01-01 12:00.
    pub days_since_epoch: f64,
    /// Approximate solar declination in degrees. Not used by the correction.
    pub declination_deg: f64,
    /// Equation of time in minutes.
    pub equation_of_time_min: f64,
    /// Longitude offset from the reference meridian in minutes.
    pub longitude_correction_min: f64,
}

impl SolarCorrection {
    pub fn total_minutes(&self) -> f64 {
        self.equation_of_time_min + self.longitude_correction_min
    }
}

/// Outcome of converting one clock reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarTimeResult {
    pub clock_time: String,
    pub true_solar_time: String,
    pub longitude: f64,
    pub chinese_hour: String,
    pub chinese_hour_index: u8,
    pub time_difference: String,
    pub true_hour: u32,
    pub true_minute: u32,
}

impl SolarTimeResult {
    /// Lunar dates cannot be corrected, so the chosen slot is carried through
    /// and both time strings read midnight.
    pub fn for_lunar(birthday: &str, slot: TimeSlot, longitude: f64) -> Self {
        let stamp = format!("{} 00:00", birthday);
        Self {
            clock_time: stamp.clone(),
            true_solar_time: stamp,
            longitude,
            chinese_hour: slot.name().to_string(),
            chinese_hour_index: slot.index(),
            time_difference: String::new(),
            true_hour: 0,
            true_minute: 0,
        }
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot::from_index(self.chinese_hour_index)
            .unwrap_or_else(|_| classify(self.true_hour, self.true_minute))
    }
}

fn days_since_epoch(date_time: NaiveDateTime) -> f64 {
    let whole_days = (date_time.date().num_days_from_ce() - EPOCH_DAYS_FROM_CE) as f64;
    let seconds = date_time.time().num_seconds_from_midnight() as f64;
    whole_days + (seconds - EPOCH_SECONDS_INTO_DAY) / SECONDS_PER_DAY
}

/// Longitude correction in minutes; zero on the reference meridian.
pub fn longitude_correction(longitude: f64) -> f64 {
    (longitude - REFERENCE_MERIDIAN) * MINUTES_PER_DEGREE
}

/// Equation of time in minutes for a day offset from the epoch.
pub fn equation_of_time(days_since_epoch: f64) -> f64 {
    let b = (360.0 / 365.0 * (days_since_epoch - 81.0)) * PI / 180.0;
    9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin()
}

pub fn solar_correction(date_time: NaiveDateTime, longitude: f64) -> SolarCorrection {
    let days = days_since_epoch(date_time);
    let declination_deg = 23.45 * (360.0 / 365.0 * (days + 284.0) * PI / 180.0).sin();
    SolarCorrection {
        days_since_epoch: days,
        declination_deg,
        equation_of_time_min: equation_of_time(days),
        longitude_correction_min: longitude_correction(longitude),
    }
}

/// Build a validated clock reading.
pub fn clock_reading(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> Result<NaiveDateTime, CalendarError> {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(CalendarError::InvalidDate { year, month, day })?;
    date.and_hms_opt(hour, minute, 0)
        .ok_or(CalendarError::InvalidTime { hour, minute })
}

/// Apply the correction to a clock reading, returning the true hour and minute.
pub fn true_solar_clock(date_time: NaiveDateTime, longitude: f64) -> (u32, u32) {
    let correction = solar_correction(date_time, longitude);
    let clock_minutes = (date_time.hour() * 60 + date_time.minute()) as f64;
    let total = (clock_minutes + correction.total_minutes()).rem_euclid(MINUTES_PER_DAY);

    let mut hour = (total / 60.0).floor() as u32;
    let mut minute = (total % 60.0).round() as u32;
    if minute == 60 {
        hour = (hour + 1) % 24;
        minute = 0;
    }
    (hour % 24, minute)
}

/// Convert a Gregorian clock reading at `longitude` into true solar time and
/// its traditional slot.
pub fn true_solar_time(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    longitude: f64,
) -> Result<SolarTimeResult, CalendarError> {
    let reading = clock_reading(year, month, day, hour, minute)?;
    let (true_hour, true_minute) = true_solar_clock(reading, longitude);
    let slot = classify(true_hour, true_minute);

    log::debug!(
        "true solar time for {}-{}-{} {:02}:{:02} at {}: {:02}:{:02} ({})",
        year, month, day, hour, minute, longitude, true_hour, true_minute, slot.name()
    );

    let hour_delta = true_hour as f64 - hour as f64;
    let minute_delta = true_minute as f64 - minute as f64;

    Ok(SolarTimeResult {
        clock_time: format!("{}-{}-{} {:02}:{:02}", year, month, day, hour, minute),
        true_solar_time: format!("{}-{}-{} {:02}:{:02}", year, month, day, true_hour, true_minute),
        longitude,
        chinese_hour: slot.name().to_string(),
        chinese_hour_index: slot.index(),
        time_difference: format!("{:+.1}小时{:+.1}分钟", hour_delta, minute_delta),
        true_hour,
        true_minute,
    })
}
