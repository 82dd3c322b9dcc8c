//! Sexagenary (干支) year labels.

pub const HEAVENLY_STEMS: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];
pub const EARTHLY_BRANCHES: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];

/// 1984 is a 甲子 year.
pub const CYCLE_ANCHOR_YEAR: i32 = 1984;

pub fn year_stem(year: i32) -> &'static str {
    HEAVENLY_STEMS[(year - CYCLE_ANCHOR_YEAR).rem_euclid(10) as usize]
}

pub fn year_branch(year: i32) -> &'static str {
    EARTHLY_BRANCHES[(year - CYCLE_ANCHOR_YEAR).rem_euclid(12) as usize]
}

/// Stem-branch label of a Gregorian year, e.g. `甲子` for 1984.
pub fn ganzhi_for_year(year: i32) -> String {
    format!("{}{}", year_stem(year), year_branch(year))
}
