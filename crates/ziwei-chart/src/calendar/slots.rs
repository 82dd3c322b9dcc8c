//! Traditional two-hour periods (时辰).
//!
//! The chart service addresses birth time by a slot index in 0..=12. The
//! midnight period is split in two: slot 0 is the early 子 hour after
//! midnight and slot 12 is the late 子 hour before it. Both share a name.

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

// (index, display name, range label, first minute of day)
pub const TIME_SLOTS: &[(u8, &str, &str, u32)] = &[
    (0, "子时", "早子 (00:00 - 01:00)", 0),
    (1, "丑时", "丑 (01:00 - 03:00)", 60),
    (2, "寅时", "寅 (03:00 - 05:00)", 180),
    (3, "卯时", "卯 (05:00 - 07:00)", 300),
    (4, "辰时", "辰 (07:00 - 09:00)", 420),
    (5, "巳时", "巳 (09:00 - 11:00)", 540),
    (6, "午时", "午 (11:00 - 13:00)", 660),
    (7, "未时", "未 (13:00 - 15:00)", 780),
    (8, "申时", "申 (15:00 - 17:00)", 900),
    (9, "酉时", "酉 (17:00 - 19:00)", 1020),
    (10, "戌时", "戌 (19:00 - 21:00)", 1140),
    (11, "亥时", "亥 (21:00 - 23:00)", 1260),
    (12, "子时", "晚子 (23:00 - 00:00)", 1380),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    index: u8,
}

impl TimeSlot {
    pub fn from_index(index: u8) -> Result<Self, CalendarError> {
        if (index as usize) < TIME_SLOTS.len() {
            Ok(Self { index })
        } else {
            Err(CalendarError::InvalidSlot { index })
        }
    }

    /// Slot index as sent to the chart service.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Display name, e.g. `巳时`.
    pub fn name(&self) -> &'static str {
        TIME_SLOTS[self.index as usize].1
    }

    /// Range label, e.g. `巳 (09:00 - 11:00)`.
    pub fn label(&self) -> &'static str {
        TIME_SLOTS[self.index as usize].2
    }
}

/// Classify a clock reading into its slot.
///
/// Windows are half-open and anchored at odd hours; 23:00 starts the late
/// 子 slot, which wraps over midnight into the early one.
pub fn classify(hour: u32, minute: u32) -> TimeSlot {
    let total = (hour * 60 + minute) % 1440;
    let index = TIME_SLOTS
        .iter()
        .rev()
        .find(|(_, _, _, start)| total >= *start)
        .map(|(index, _, _, _)| *index)
        .unwrap_or(0);
    TimeSlot { index }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(0, 0).index(), 0);
        assert_eq!(classify(0, 59).index(), 0);
        assert_eq!(classify(1, 0).index(), 1);
        assert_eq!(classify(2, 59).index(), 1);
        assert_eq!(classify(9, 0).index(), 5);
        assert_eq!(classify(10, 59).index(), 5);
        assert_eq!(classify(22, 59).index(), 11);
        assert_eq!(classify(23, 0).index(), 12);
    }

    #[test]
    fn test_midnight_names_match() {
        assert_eq!(classify(23, 30).name(), "子时");
        assert_eq!(classify(0, 30).name(), "子时");
    }

    #[test]
    fn test_from_index_rejects_out_of_range() {
        assert!(TimeSlot::from_index(12).is_ok());
        assert_eq!(
            TimeSlot::from_index(13),
            Err(CalendarError::InvalidSlot { index: 13 })
        );
    }
}
