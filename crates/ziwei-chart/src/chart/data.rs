//! Chart document produced by the external chart service.
//!
//! Every field is optional. Missing keys, `null`s and empty strings all read
//! as "absent" and the accessors substitute placeholders instead of failing.

use serde::{Deserialize, Deserializer, Serialize};

use crate::calendar::mutagen::{mutagen_of_star, mutagens_for_stem, Mutagen};

/// Placeholder for missing identity fields.
pub const UNKNOWN: &str = "未知";
/// Placeholder for empty star lists.
pub const NONE: &str = "无";

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Star {
    pub name: Option<String>,
    pub brightness: Option<String>,
    /// Birth-year transformation carried by the star.
    pub mutagen: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Star {
    pub fn name(&self) -> &str {
        present(&self.name).unwrap_or("")
    }

    pub fn brightness(&self) -> Option<&str> {
        present(&self.brightness)
    }

    pub fn mutagen(&self) -> Option<&str> {
        present(&self.mutagen)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecadalInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub range: Vec<i32>,
    pub heavenly_stem: Option<String>,
    pub earthly_branch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Palace {
    pub name: Option<String>,
    pub heavenly_stem: Option<String>,
    pub earthly_branch: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub major_stars: Vec<Star>,
    #[serde(deserialize_with = "null_as_default")]
    pub minor_stars: Vec<Star>,
    #[serde(deserialize_with = "null_as_default")]
    pub adjective_stars: Vec<Star>,
    #[serde(deserialize_with = "null_as_default")]
    pub decadal: DecadalInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub ages: Vec<i32>,
    pub suiqian12: Option<String>,
    pub jiangqian12: Option<String>,
    pub changsheng12: Option<String>,
    pub boshi12: Option<String>,
    pub is_body_palace: Option<bool>,
}

impl Palace {
    pub fn name(&self) -> &str {
        present(&self.name).unwrap_or(UNKNOWN)
    }

    pub fn heavenly_stem(&self) -> &str {
        present(&self.heavenly_stem).unwrap_or("")
    }

    pub fn earthly_branch(&self) -> &str {
        present(&self.earthly_branch).unwrap_or("")
    }

    /// Stem-branch pair, e.g. `甲子`.
    pub fn stem_branch(&self) -> String {
        format!("{}{}", self.heavenly_stem(), self.earthly_branch())
    }

    /// Decade age range; `(0, 0)` when the service omitted it.
    pub fn decadal_range(&self) -> (i32, i32) {
        let range = &self.decadal.range;
        (
            range.first().copied().unwrap_or(0),
            range.get(1).copied().unwrap_or(0),
        )
    }

    /// The four annual cycle indicators that are present, with their labels.
    pub fn cycle_indicators(&self) -> Vec<(&'static str, &str)> {
        [
            ("岁前星", &self.suiqian12),
            ("将前星", &self.jiangqian12),
            ("十二长生", &self.changsheng12),
            ("太岁煞禄", &self.boshi12),
        ]
        .into_iter()
        .filter_map(|(label, value)| present(value).map(|v| (label, v)))
        .collect()
    }

    pub fn contains_age(&self, nominal_age: i32) -> bool {
        let (start, end) = self.decadal_range();
        start <= nominal_age && nominal_age <= end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Astrolabe {
    pub gender: Option<String>,
    pub solar_date: Option<String>,
    pub lunar_date: Option<String>,
    pub chinese_date: Option<String>,
    pub time: Option<String>,
    pub time_range: Option<String>,
    pub sign: Option<String>,
    pub zodiac: Option<String>,
    /// Soul star (命主).
    pub soul: Option<String>,
    /// Body star (身主).
    pub body: Option<String>,
    pub earthly_branch_of_soul_palace: Option<String>,
    pub earthly_branch_of_body_palace: Option<String>,
    pub five_elements_class: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub palaces: Vec<Palace>,
}

impl Astrolabe {
    pub fn gender(&self) -> &str {
        present(&self.gender).unwrap_or(UNKNOWN)
    }

    pub fn soul(&self) -> &str {
        present(&self.soul).unwrap_or(UNKNOWN)
    }

    pub fn body(&self) -> &str {
        present(&self.body).unwrap_or(UNKNOWN)
    }

    pub fn lunar_date(&self) -> &str {
        present(&self.lunar_date).unwrap_or(UNKNOWN)
    }

    pub fn chinese_date(&self) -> &str {
        present(&self.chinese_date).unwrap_or(UNKNOWN)
    }

    pub fn body_palace_branch(&self) -> &str {
        present(&self.earthly_branch_of_body_palace).unwrap_or(UNKNOWN)
    }

    /// Clock time string reconstructed from the service's own fields, used
    /// when no solar-time result is available.
    pub fn fallback_clock_time(&self) -> String {
        let start = present(&self.time_range)
            .and_then(|range| range.split('~').next())
            .unwrap_or("");
        format!("{} {}", present(&self.solar_date).unwrap_or(""), start)
    }

    pub fn time_name(&self) -> &str {
        present(&self.time).unwrap_or("")
    }

    pub fn palace_by_branch(&self, branch: &str) -> Option<&Palace> {
        self.palaces.iter().find(|p| p.earthly_branch() == branch)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoroscopeItem {
    pub name: Option<String>,
    pub heavenly_stem: Option<String>,
    pub earthly_branch: Option<String>,
}

impl HoroscopeItem {
    pub fn heavenly_stem(&self) -> Option<&str> {
        present(&self.heavenly_stem)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgeInfo {
    pub nominal_age: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Horoscope {
    #[serde(deserialize_with = "null_as_default")]
    pub decadal: HoroscopeItem,
    #[serde(deserialize_with = "null_as_default")]
    pub yearly: HoroscopeItem,
    #[serde(deserialize_with = "null_as_default")]
    pub age: AgeInfo,
}

/// Which fortune window a transformation lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Decadal,
    #[default]
    Yearly,
}

impl Horizon {
    pub fn label(&self) -> &'static str {
        match self {
            Horizon::Decadal => "大限",
            Horizon::Yearly => "流年",
        }
    }

    /// Short badge prefix used by the grid renderer.
    pub fn badge(&self) -> &'static str {
        match self {
            Horizon::Decadal => "限",
            Horizon::Yearly => "流",
        }
    }
}

impl Horoscope {
    pub fn stem(&self, horizon: Horizon) -> Option<&str> {
        match horizon {
            Horizon::Decadal => self.decadal.heavenly_stem(),
            Horizon::Yearly => self.yearly.heavenly_stem(),
        }
    }

    pub fn nominal_age(&self) -> Option<i32> {
        self.age.nominal_age.filter(|age| *age > 0)
    }

    /// Transformation applied to `star` by the horizon's stem.
    pub fn mutagen_for(&self, horizon: Horizon, star: &str) -> Option<Mutagen> {
        self.stem(horizon).and_then(|stem| mutagen_of_star(star, stem))
    }

    /// The four transformation stars of the horizon in 禄权科忌 order; empty
    /// when the horizon stem is missing or unknown.
    pub fn mutagen_stars(&self, horizon: Horizon) -> Vec<&'static str> {
        self.stem(horizon)
            .map(|stem| mutagens_for_stem(stem).into_values().collect())
            .unwrap_or_default()
    }
}

/// Full response of the chart service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartData {
    #[serde(deserialize_with = "null_as_default")]
    pub astrolabe: Astrolabe,
    #[serde(deserialize_with = "null_as_default")]
    pub horoscope: Horoscope,
    pub target_year: Option<i32>,
}

impl ChartData {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn palaces(&self) -> &[Palace] {
        &self.astrolabe.palaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nulls_and_missing_keys_are_tolerated() {
        let chart = ChartData::from_value(json!({
            "astrolabe": {
                "soul": null,
                "palaces": [{ "name": "命宫", "majorStars": null, "decadal": null }]
            },
            "horoscope": null
        }))
        .unwrap();

        assert_eq!(chart.astrolabe.soul(), UNKNOWN);
        assert_eq!(chart.palaces()[0].decadal_range(), (0, 0));
        assert!(chart.palaces()[0].major_stars.is_empty());
        assert_eq!(chart.horoscope.stem(Horizon::Yearly), None);
    }

    #[test]
    fn test_empty_strings_read_as_absent() {
        let star = Star {
            name: Some("紫微".into()),
            brightness: Some(String::new()),
            mutagen: None,
            kind: None,
        };
        assert_eq!(star.brightness(), None);
    }

    #[test]
    fn test_fallback_clock_time() {
        let astrolabe = Astrolabe {
            solar_date: Some("2000-5-23".into()),
            time_range: Some("09:00~11:00".into()),
            ..Default::default()
        };
        assert_eq!(astrolabe.fallback_clock_time(), "2000-5-23 09:00");
    }

    #[test]
    fn test_horizon_mutagen_lookup() {
        let horoscope = Horoscope {
            yearly: HoroscopeItem { heavenly_stem: Some("甲".into()), ..Default::default() },
            ..Default::default()
        };
        assert_eq!(horoscope.mutagen_stars(Horizon::Yearly), vec!["廉贞", "破军", "武曲", "太阳"]);
        assert!(horoscope.mutagen_stars(Horizon::Decadal).is_empty());
        assert_eq!(horoscope.mutagen_for(Horizon::Yearly, "太阳"), Some(Mutagen::Ji));
    }
}
