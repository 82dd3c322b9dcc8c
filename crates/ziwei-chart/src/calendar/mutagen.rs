//! Four transformations (四化) keyed by heavenly stem.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mutagen {
    #[serde(rename = "禄")]
    Lu,
    #[serde(rename = "权")]
    Quan,
    #[serde(rename = "科")]
    Ke,
    #[serde(rename = "忌")]
    Ji,
}

impl Mutagen {
    pub const ALL: [Mutagen; 4] = [Mutagen::Lu, Mutagen::Quan, Mutagen::Ke, Mutagen::Ji];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mutagen::Lu => "禄",
            Mutagen::Quan => "权",
            Mutagen::Ke => "科",
            Mutagen::Ji => "忌",
        }
    }
}

impl fmt::Display for Mutagen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// stem -> [禄, 权, 科, 忌]
pub const MUTAGEN_TABLE: &[(&str, [&str; 4])] = &[
    ("甲", ["廉贞", "破军", "武曲", "太阳"]),
    ("乙", ["天机", "天梁", "紫微", "太阴"]),
    ("丙", ["天同", "天机", "文昌", "廉贞"]),
    ("丁", ["太阴", "天同", "天机", "巨门"]),
    ("戊", ["贪狼", "太阴", "右弼", "天机"]),
    ("己", ["武曲", "贪狼", "天梁", "文曲"]),
    ("庚", ["太阳", "武曲", "太阴", "天同"]),
    ("辛", ["巨门", "太阳", "文曲", "文昌"]),
    ("壬", ["天梁", "紫微", "左辅", "武曲"]),
    ("癸", ["破军", "巨门", "太阴", "贪狼"]),
];

fn stars_for_stem(stem: &str) -> Option<&'static [&'static str; 4]> {
    MUTAGEN_TABLE
        .iter()
        .find(|(s, _)| *s == stem)
        .map(|(_, stars)| stars)
}

/// Transformation stars for a stem. An unknown stem yields an empty map.
pub fn mutagens_for_stem(stem: &str) -> BTreeMap<Mutagen, &'static str> {
    match stars_for_stem(stem) {
        Some(stars) => Mutagen::ALL.into_iter().zip(stars.iter().copied()).collect(),
        None => BTreeMap::new(),
    }
}

/// Which transformation, if any, `stem` applies to `star`.
pub fn mutagen_of_star(star: &str, stem: &str) -> Option<Mutagen> {
    let stars = stars_for_stem(stem)?;
    Mutagen::ALL
        .into_iter()
        .zip(stars.iter())
        .find(|(_, s)| **s == star)
        .map(|(m, _)| m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_stem_maps_four_distinct_stars() {
        for stem in crate::calendar::ganzhi::HEAVENLY_STEMS {
            let map = mutagens_for_stem(stem);
            assert_eq!(map.len(), 4, "stem {}", stem);
            let distinct: HashSet<_> = map.values().collect();
            assert_eq!(distinct.len(), 4, "stem {}", stem);
        }
    }

    #[test]
    fn test_unknown_stem_is_empty() {
        assert!(mutagens_for_stem("子").is_empty());
        assert!(mutagens_for_stem("").is_empty());
        assert_eq!(mutagen_of_star("太阳", "?"), None);
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(mutagen_of_star("太阳", "甲"), Some(Mutagen::Ji));
        assert_eq!(mutagen_of_star("廉贞", "甲"), Some(Mutagen::Lu));
        assert_eq!(mutagen_of_star("紫微", "甲"), None);
    }
}
