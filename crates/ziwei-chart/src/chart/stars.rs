//! Adjective stars worth surfacing: romance, conflict and virtue indicators.
//! Everything else in a palace's adjective list is noise for interpretation.

use std::collections::HashSet;

use crate::chart::data::Star;

pub const IMPORTANT_ADJECTIVE_STARS: &[&str] = &[
    "红鸾", "天喜", "天姚", "咸池", "天刑", "天虚", "天哭", "三台", "八座", "恩光", "天贵", "龙池",
    "凤阁", "孤辰", "寡宿", "破碎", "天德", "解神", "天使", "封诰", "天伤", "天空", "劫煞", "天福",
    "截空", "蜚廉", "年解", "旬空", "阴煞", "月德", "天官", "台辅", "天巫", "大耗", "龙德",
];

lazy_static::lazy_static! {
    static ref IMPORTANT_SET: HashSet<&'static str> =
        IMPORTANT_ADJECTIVE_STARS.iter().copied().collect();
}

pub fn is_important(name: &str) -> bool {
    IMPORTANT_SET.contains(name)
}

/// Stars from `stars` on the allow-list, in their original order.
pub fn important_stars(stars: &[Star]) -> impl Iterator<Item = &Star> {
    stars.iter().filter(|s| is_important(s.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_has_no_duplicates() {
        assert_eq!(IMPORTANT_SET.len(), IMPORTANT_ADJECTIVE_STARS.len());
    }

    #[test]
    fn test_filter_keeps_order() {
        let stars: Vec<Star> = ["天才", "天喜", "台辅", "红鸾"]
            .iter()
            .map(|n| Star { name: Some(n.to_string()), ..Default::default() })
            .collect();
        let kept: Vec<&str> = important_stars(&stars).map(|s| s.name()).collect();
        assert_eq!(kept, vec!["天喜", "台辅", "红鸾"]);
    }
}
