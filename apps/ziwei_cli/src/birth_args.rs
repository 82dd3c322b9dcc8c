use anyhow::Context;
use clap::{Args, ValueEnum};

use ziwei_chart::{BirthInput, Gender};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Calendar {
    Solar,
    Lunar,
}

/// Birth data shared by the `chart` and `chat` commands.
#[derive(Args, Debug, Clone)]
pub(crate) struct BirthArgs {
    /// Birth date as YYYY-M-D (lunar month/day with --calendar lunar).
    #[arg(long)]
    pub date: String,

    /// Clock time as HH:MM. Ignored for lunar dates.
    #[arg(long, default_value = "12:00")]
    pub time: String,

    #[arg(long, value_enum, default_value_t = Calendar::Solar)]
    pub calendar: Calendar,

    /// The lunar month is a leap month.
    #[arg(long)]
    pub leap: bool,

    /// Time slot index 0-12 (0 early 子, 12 late 子). Required for lunar dates.
    #[arg(long)]
    pub slot: Option<u8>,

    /// 男/女 or male/female.
    #[arg(long, value_parser = parse_gender)]
    pub gender: Gender,

    /// Birthplace longitude in degrees east (default from config).
    #[arg(long)]
    pub longitude: Option<f64>,
}

fn parse_gender(value: &str) -> Result<Gender, String> {
    Gender::parse(value).ok_or_else(|| format!("unknown gender '{value}', expected 男 or 女"))
}

pub(crate) fn parse_date(text: &str) -> anyhow::Result<(i32, u32, u32)> {
    let parts: Vec<&str> = text.trim().split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        anyhow::bail!("Expected a date like 2000-5-23, got '{text}'");
    };
    Ok((
        year.parse().with_context(|| format!("Bad year in '{text}'"))?,
        month.parse().with_context(|| format!("Bad month in '{text}'"))?,
        day.parse().with_context(|| format!("Bad day in '{text}'"))?,
    ))
}

pub(crate) fn parse_clock(text: &str) -> anyhow::Result<(u32, u32)> {
    let (hour, minute) = text
        .trim()
        .split_once(':')
        .with_context(|| format!("Expected a time like 10:50, got '{text}'"))?;
    Ok((
        hour.parse().with_context(|| format!("Bad hour in '{text}'"))?,
        minute.parse().with_context(|| format!("Bad minute in '{text}'"))?,
    ))
}

impl BirthArgs {
    pub fn to_input(&self, default_longitude: f64) -> anyhow::Result<BirthInput> {
        let (year, month, day) = parse_date(&self.date)?;
        let longitude = self.longitude.unwrap_or(default_longitude);
        let input = match self.calendar {
            Calendar::Solar => {
                let (hour, minute) = parse_clock(&self.time)?;
                let mut input = BirthInput::solar(year, month, day, hour, minute, self.gender);
                input.hour_slot = self.slot;
                input
            }
            Calendar::Lunar => {
                let slot = self
                    .slot
                    .context("Lunar dates need an explicit --slot (0-12)")?;
                BirthInput::lunar(year, month, day, self.leap, slot, self.gender)
            }
        };
        Ok(input.with_longitude(longitude))
    }
}
