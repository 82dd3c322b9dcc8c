//! Decade and year choices derived from a chart.
//!
//! Ages are nominal (虚岁): a person is 1 in their birth year, so the
//! Gregorian year of age `a` is `birth_year + a - 1`.

use serde::{Deserialize, Serialize};

use crate::calendar::ganzhi::ganzhi_for_year;
use crate::chart::data::ChartData;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decade {
    pub start_age: i32,
    pub end_age: i32,
    /// Stem-branch of the palace that hosts the decade.
    pub ganzhi: String,
}

impl Decade {
    pub fn label(&self) -> String {
        format!("{}-{} {}", self.start_age, self.end_age, self.ganzhi)
    }

    pub fn contains(&self, nominal_age: i32) -> bool {
        self.start_age <= nominal_age && nominal_age <= self.end_age
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearOption {
    pub year: i32,
    pub nominal_age: i32,
    pub ganzhi: String,
}

impl YearOption {
    pub fn label(&self) -> String {
        format!("{} {}", self.year, self.ganzhi)
    }
}

/// Decades of the chart ordered by starting age. Palaces without a range
/// are skipped.
pub fn decades(chart: &ChartData) -> Vec<Decade> {
    let mut decades: Vec<Decade> = chart
        .palaces()
        .iter()
        .filter_map(|palace| {
            let (start_age, end_age) = palace.decadal_range();
            if start_age == 0 && end_age == 0 {
                return None;
            }
            Some(Decade {
                start_age,
                end_age,
                ganzhi: palace.stem_branch(),
            })
        })
        .collect();
    decades.sort_by_key(|d| d.start_age);
    decades
}

/// Nominal age reported by the service, else derived from the birth year.
pub fn current_nominal_age(chart: &ChartData, birth_year: i32, this_year: i32) -> i32 {
    chart
        .horoscope
        .nominal_age()
        .unwrap_or(this_year - birth_year + 1)
}

pub fn birth_year_from(target_year: i32, nominal_age: i32) -> i32 {
    target_year - nominal_age + 1
}

/// First Gregorian year of a decade.
pub fn decade_target_year(birth_year: i32, decade: &Decade) -> i32 {
    birth_year + decade.start_age - 1
}

pub fn years_in_decade(birth_year: i32, decade: &Decade) -> Vec<YearOption> {
    (decade.start_age..=decade.end_age)
        .map(|age| {
            let year = birth_year + age - 1;
            YearOption {
                year,
                nominal_age: age,
                ganzhi: ganzhi_for_year(year),
            }
        })
        .collect()
}

/// Index of the decade holding `nominal_age`; the last match wins, 0 when
/// none does.
pub fn selected_decade_index(decades: &[Decade], nominal_age: i32) -> usize {
    decades
        .iter()
        .rposition(|d| d.contains(nominal_age))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_arithmetic() {
        assert_eq!(birth_year_from(2026, 27), 2000);
        let decade = Decade { start_age: 3, end_age: 12, ganzhi: "甲申".into() };
        assert_eq!(decade_target_year(2000, &decade), 2002);

        let years = years_in_decade(2000, &decade);
        assert_eq!(years.len(), 10);
        assert_eq!(years[0].year, 2002);
        assert_eq!(years[0].ganzhi, "壬午");
        assert_eq!(years[9].nominal_age, 12);
    }

    #[test]
    fn test_selected_decade_defaults_to_first() {
        let decades = vec![
            Decade { start_age: 3, end_age: 12, ganzhi: "甲申".into() },
            Decade { start_age: 13, end_age: 22, ganzhi: "乙酉".into() },
        ];
        assert_eq!(selected_decade_index(&decades, 15), 1);
        assert_eq!(selected_decade_index(&decades, 90), 0);
    }
}
