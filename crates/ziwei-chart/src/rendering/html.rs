use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::calendar::solar_time::SolarTimeResult;
use crate::chart::data::{ChartData, Horizon, Palace, Star};
use crate::chart::stars::is_important;

/// Branch of each outer cell, row by row. The center block sits after the
/// first cell of the second row and spans the middle two rows.
const GRID_ROWS: [&[&str]; 4] = [
    &["巳", "午", "未", "申"],
    &["辰", "酉"],
    &["卯", "戌"],
    &["寅", "丑", "子", "亥"],
];

/// Grid rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Adjective stars shown per palace after allow-list filtering.
    pub max_adjective_stars: usize,
    pub title: String,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            max_adjective_stars: 8,
            title: "紫微斗数命盘".to_string(),
        }
    }
}

/// Escapes text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the 4×4 palace grid as one line of HTML.
pub struct GridRenderer {
    settings: GridSettings,
}

impl Default for GridRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl GridRenderer {
    pub fn new() -> Self {
        Self {
            settings: GridSettings::default(),
        }
    }

    pub fn with_settings(settings: GridSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn render(&self, chart: Option<&ChartData>, solar: Option<&SolarTimeResult>) -> String {
        let Some(chart) = chart else {
            return self.placeholder();
        };

        let mut html = String::from(r#"<div class="ziwei-grid">"#);
        for (row, branches) in GRID_ROWS.iter().enumerate() {
            for (col, branch) in branches.iter().enumerate() {
                html.push_str(&self.palace_cell(chart, branch));
                if row == 1 && col == 0 {
                    html.push_str(&self.center_cell(chart, solar));
                }
            }
        }
        html.push_str("</div>");
        html
    }

    fn placeholder(&self) -> String {
        format!(
            concat!(
                r#"<div class="ziwei-grid"><div class="center-cell">"#,
                r#"<div class="center-title">{}</div>"#,
                r#"<div class="bazi-tag">请先开始排盘</div>"#,
                r#"<div class="center-info"><div>请先输入出生信息</div><div>然后开始排盘</div></div>"#,
                "</div></div>"
            ),
            escape_html(&self.settings.title)
        )
    }

    fn star_html(
        &self,
        chart: &ChartData,
        star: &Star,
        class: &str,
        with_brightness: bool,
    ) -> String {
        let name = star.name();
        let mut html = format!(r#"<span class="{class}">{}"#, escape_html(name));
        if with_brightness {
            if let Some(brightness) = star.brightness() {
                let _ = write!(html, "[{}]", escape_html(brightness));
            }
        }
        html.push_str("</span>");

        if let Some(mutagen) = star.mutagen() {
            let _ = write!(
                html,
                r#"<span class="mut-birth">[↑{}]</span>"#,
                escape_html(mutagen)
            );
        }
        let badges = [
            (Horizon::Decadal, "mut-decadal"),
            (Horizon::Yearly, "mut-yearly"),
        ];
        for (horizon, badge_class) in badges {
            if let Some(mutagen) = chart.horoscope.mutagen_for(horizon, name) {
                let _ = write!(
                    html,
                    r#"<span class="{badge_class}">[{}{}]</span>"#,
                    horizon.badge(),
                    mutagen
                );
            }
        }
        html
    }

    fn palace_cell(&self, chart: &ChartData, branch: &str) -> String {
        let Some(palace) = chart.astrolabe.palace_by_branch(branch) else {
            return r#"<div class="palace-cell"></div>"#.to_string();
        };

        let mut stars = String::from(r#"<div class="stars-box">"#);
        let major: String = palace
            .major_stars
            .iter()
            .map(|s| self.star_html(chart, s, "star-major", true))
            .collect();
        let _ = write!(stars, r#"<div class="star-section">{major}</div>"#);

        if !palace.minor_stars.is_empty() {
            let minor: String = palace
                .minor_stars
                .iter()
                .map(|s| self.star_html(chart, s, "star-minor", true))
                .collect();
            let _ = write!(stars, r#"<div class="star-section">{minor}</div>"#);
        }

        let adjective: Vec<String> = palace
            .adjective_stars
            .iter()
            .filter(|s| is_important(s.name()))
            .take(self.settings.max_adjective_stars)
            .map(|s| self.star_html(chart, s, "star-adj", false))
            .collect();
        if !adjective.is_empty() {
            let _ = write!(stars, r#"<div class="star-section">{}</div>"#, adjective.concat());
        }
        stars.push_str("</div>");

        let luck = match chart.horoscope.nominal_age() {
            Some(age) if palace.contains_age(age) => r#"<div class="luck-indicator">当前大限</div>"#,
            _ => "",
        };

        format!(
            r#"<div class="palace-cell">{luck}{stars}{}</div>"#,
            palace_footer(palace)
        )
    }

    fn center_cell(&self, chart: &ChartData, solar: Option<&SolarTimeResult>) -> String {
        let pan = &chart.astrolabe;
        let clock_time = solar
            .map(|s| s.clock_time.clone())
            .unwrap_or_else(|| pan.fallback_clock_time());
        let true_solar_time = solar
            .map(|s| s.true_solar_time.clone())
            .unwrap_or_else(|| clock_time.clone());
        let chinese_hour = solar
            .map(|s| s.chinese_hour.as_str())
            .unwrap_or_else(|| pan.time_name());

        let mut html = String::from(r#"<div class="center-cell">"#);
        let _ = write!(
            html,
            r#"<div class="center-title">{}</div>"#,
            escape_html(&self.settings.title)
        );
        let _ = write!(html, r#"<div class="bazi-tag">{}</div>"#, escape_html(pan.chinese_date()));
        html.push_str(r#"<div class="center-info">"#);
        let _ = write!(html, "<div>真太阳时: {}</div>", escape_html(&true_solar_time));
        let _ = write!(html, "<div>钟表时间: {}</div>", escape_html(&clock_time));
        let _ = write!(
            html,
            "<div>农历: {}{}</div>",
            escape_html(pan.lunar_date()),
            escape_html(chinese_hour)
        );
        let _ = write!(
            html,
            "<div>命主: {}; 身主: {}</div>",
            escape_html(pan.soul()),
            escape_html(pan.body())
        );
        let _ = write!(
            html,
            "<div>子年斗君: 寅; 身宫: {}</div>",
            escape_html(pan.body_palace_branch())
        );
        html.push_str("</div>");
        html.push_str(
            r#"<div class="mutagen-legend"><div>四化图示: ↑生年 限大限 流流年</div><div>运限指示: 当前大限高亮显示</div></div>"#,
        );
        html.push_str("</div>");
        html
    }
}

fn palace_footer(palace: &Palace) -> String {
    let (start, end) = palace.decadal_range();
    format!(
        concat!(
            r#"<div class="palace-footer">"#,
            r#"<span class="palace-name">{}</span>"#,
            r#"<span class="palace-dizhi">[{}]</span>"#,
            r#"<div class="palace-age">大限:{}~{}</div>"#,
            "</div>"
        ),
        escape_html(palace.name()),
        escape_html(&palace.stem_branch()),
        start,
        end
    )
}

/// Renders the grid with default settings.
pub fn render_html_grid(chart: Option<&ChartData>, solar: Option<&SolarTimeResult>) -> String {
    GridRenderer::new().render(chart, solar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"a" & 'b'</b>"#),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("紫微"), "紫微");
    }

    #[test]
    fn test_placeholder_without_chart() {
        let html = render_html_grid(None, None);
        assert!(html.contains("请先开始排盘"));
        assert!(!html.contains("palace-cell"));
    }

    #[test]
    fn test_missing_palaces_render_empty_cells() {
        let html = render_html_grid(Some(&ChartData::default()), None);
        assert_eq!(html.matches(r#"<div class="palace-cell"></div>"#).count(), 12);
        assert_eq!(html.matches("center-cell").count(), 1);
    }
}
