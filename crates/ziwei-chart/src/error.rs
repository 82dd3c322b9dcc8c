use thiserror::Error;

/// Errors raised while turning user-supplied calendar values into chart inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("Invalid clock time {hour}:{minute:02}. Hours run 0-23, minutes 0-59")]
    InvalidTime { hour: u32, minute: u32 },
    #[error("Invalid time slot index: {index}. Valid slots: 0-12")]
    InvalidSlot { index: u8 },
    #[error("Lunar birth input needs an explicit time slot (0-12)")]
    MissingSlot,
}
