//! Per-palace text blocks.

use crate::chart::data::{Palace, Star, NONE};
use crate::chart::stars::important_stars;

/// Branch drawing used for a palace block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalaceLayout {
    /// Indented tree used in the natal data context.
    Tree,
    /// Flat pipe rails used in the per-question prompt.
    Pipe,
}

/// Ages of the small-limit cycle: even positions, or the first five entries
/// of a short list.
pub fn small_limit_ages(ages: &[i32]) -> Vec<i32> {
    if ages.len() > 5 {
        ages.iter().step_by(2).copied().collect()
    } else {
        ages.iter().take(5).copied().collect()
    }
}

/// Ages of the yearly cycle: odd positions, or entries one through five of a
/// short list.
pub fn yearly_ages(ages: &[i32]) -> Vec<i32> {
    if ages.len() > 5 {
        ages.iter().skip(1).step_by(2).copied().collect()
    } else {
        ages.iter().skip(1).take(5).copied().collect()
    }
}

fn join_ages(ages: &[i32]) -> String {
    ages.iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join("，")
}

fn star_label(star: &Star, with_mutagen: bool) -> String {
    let mut label = star.name().to_string();
    if let Some(brightness) = star.brightness() {
        label.push_str(&format!("[{brightness}]"));
    }
    if with_mutagen {
        if let Some(mutagen) = star.mutagen() {
            label.push_str(&format!("[↑{mutagen}]"));
        }
    }
    label
}

fn join_or_none<'a>(stars: impl Iterator<Item = &'a Star>, with_mutagen: bool) -> String {
    let labels: Vec<String> = stars.map(|s| star_label(s, with_mutagen)).collect();
    if labels.is_empty() {
        NONE.to_string()
    } else {
        labels.join("，")
    }
}

pub fn major_stars_text(palace: &Palace) -> String {
    join_or_none(palace.major_stars.iter(), true)
}

pub fn minor_stars_text(palace: &Palace) -> String {
    join_or_none(palace.minor_stars.iter(), false)
}

pub fn adjective_stars_text(palace: &Palace) -> String {
    join_or_none(important_stars(&palace.adjective_stars), false)
}

/// Renders one palace, each line newline-terminated.
pub fn render_palace(palace: &Palace, layout: PalaceLayout) -> String {
    let (start, end) = palace.decadal_range();
    let header = match layout {
        PalaceLayout::Tree => format!("- {}宫 [{}]", palace.name(), palace.stem_branch()),
        PalaceLayout::Pipe => format!("- {}宫[{}]", palace.name(), palace.stem_branch()),
    };
    let (item, last, nested, nested_last) = match layout {
        PalaceLayout::Tree => ("  ├", "  └", "  │ ├", "  │ ├"),
        PalaceLayout::Pipe => ("│ │ ├", "│ │ └", "│ │ ├", "│ │ └"),
    };

    let mut out = String::new();
    out.push_str(&header);
    out.push('\n');
    out.push_str(&format!("{item}主星 : {}\n", major_stars_text(palace)));
    out.push_str(&format!("{item}辅星 : {}\n", minor_stars_text(palace)));
    out.push_str(&format!("{item}小星 : {}\n", adjective_stars_text(palace)));

    let indicators = palace.cycle_indicators();
    if !indicators.is_empty() {
        out.push_str(&format!("{item}神煞\n"));
        for (label, value) in indicators {
            // Only 太岁煞禄 closes the group, even when it is not the last
            // indicator present.
            let rail = if label == "太岁煞禄" { nested_last } else { nested };
            out.push_str(&format!("{rail}{label} : {value}\n"));
        }
    }

    out.push_str(&format!("{item}大限 : {start}~{end}虚岁\n"));
    out.push_str(&format!(
        "{item}小限 : {}虚岁\n",
        join_ages(&small_limit_ages(&palace.ages))
    ));
    out.push_str(&format!(
        "{last}流年 : {}虚岁\n",
        join_ages(&yearly_ages(&palace.ages))
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_striding_for_long_lists() {
        let ages = [3, 9, 15, 21, 27, 33];
        assert_eq!(small_limit_ages(&ages), vec![3, 15, 27]);
        assert_eq!(yearly_ages(&ages), vec![9, 21, 33]);
    }

    #[test]
    fn test_short_lists_slice_directly() {
        let ages = [3, 9, 15];
        assert_eq!(small_limit_ages(&ages), vec![3, 9, 15]);
        assert_eq!(yearly_ages(&ages), vec![9, 15]);

        let five = [1, 2, 3, 4, 5];
        assert_eq!(small_limit_ages(&five), vec![1, 2, 3, 4, 5]);
        assert_eq!(yearly_ages(&five), vec![2, 3, 4, 5]);

        assert!(small_limit_ages(&[]).is_empty());
        assert!(yearly_ages(&[]).is_empty());
    }

    #[test]
    fn test_empty_palace_uses_placeholders() {
        let text = render_palace(&Palace::default(), PalaceLayout::Tree);
        assert_eq!(
            text,
            "- 未知宫 []\n  ├主星 : 无\n  ├辅星 : 无\n  ├小星 : 无\n  ├大限 : 0~0虚岁\n  ├小限 : 虚岁\n  └流年 : 虚岁\n"
        );
    }

    #[test]
    fn test_pipe_layout_closes_indicator_group() {
        let palace = Palace {
            name: Some("命".into()),
            heavenly_stem: Some("甲".into()),
            earthly_branch: Some("子".into()),
            changsheng12: Some("长生".into()),
            boshi12: Some("博士".into()),
            ..Default::default()
        };
        let text = render_palace(&palace, PalaceLayout::Pipe);
        assert!(text.starts_with("- 命宫[甲子]\n"));
        assert!(text.contains("│ │ ├神煞\n│ │ ├十二长生 : 长生\n│ │ └太岁煞禄 : 博士\n"));
        assert!(text.ends_with("│ │ └流年 : 虚岁\n"));
    }
}
