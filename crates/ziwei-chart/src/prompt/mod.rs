//! Chart-to-text formatting for the chat model.
//!
//! Two renderings of the same chart exist: the natal context, built once when
//! a chart is loaded, and the master prompt, rebuilt for every question with
//! the transformations of the selected horizon.

pub mod palace;
pub mod templates;

use serde::{Deserialize, Serialize};

use crate::calendar::solar_time::{SolarTimeResult, DEFAULT_LONGITUDE};
use crate::chart::data::{ChartData, Horizon};

pub use palace::{render_palace, small_limit_ages, yearly_ages, PalaceLayout};
pub use templates::GREETING;

/// System persona plus the structured chart dump that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptContext {
    pub system: String,
    pub data_context: String,
}

fn basic_info(chart: &ChartData, solar: Option<&SolarTimeResult>) -> String {
    let pan = &chart.astrolabe;
    let clock_time = solar
        .map(|s| s.clock_time.clone())
        .unwrap_or_else(|| pan.fallback_clock_time());
    let true_solar_time = solar
        .map(|s| s.true_solar_time.clone())
        .unwrap_or_else(|| clock_time.clone());
    let chinese_hour = solar
        .map(|s| s.chinese_hour.clone())
        .unwrap_or_else(|| pan.time_name().to_string());
    let longitude = solar.map(|s| s.longitude).unwrap_or(DEFAULT_LONGITUDE);

    let mut info = String::new();
    info.push_str(&format!("性别：{}\n", pan.gender()));
    info.push_str(&format!("地理经度：{longitude}\n"));
    info.push_str(&format!("钟表时间：{clock_time}\n"));
    info.push_str(&format!("真太阳时：{true_solar_time}\n"));
    info.push_str(&format!("农历时间：{}{chinese_hour}\n", pan.lunar_date()));
    info.push_str(&format!("节气四柱：{}\n", pan.chinese_date()));
    info.push_str(&format!(
        "身主:{}; 命主:{}; 子年斗君:寅; 身宫:{}\n",
        pan.body(),
        pan.soul(),
        pan.body_palace_branch()
    ));
    info
}

/// Natal persona and data context for a freshly loaded chart.
pub fn natal_prompt(chart: &ChartData, solar: Option<&SolarTimeResult>) -> PromptContext {
    let palaces: String = chart
        .palaces()
        .iter()
        .map(|p| render_palace(p, PalaceLayout::Tree) + "\n")
        .collect();

    log::debug!("natal prompt built for {} palaces", chart.palaces().len());
    PromptContext {
        system: templates::NATAL_SYSTEM_PROMPT.to_string(),
        data_context: format!(
            "【基本信息】\n{}\n\n【命盘十二宫】\n{palaces}",
            basic_info(chart, solar)
        ),
    }
}

/// Formats a star list the way the chat model has always seen it:
/// `['廉贞', '破军']`, or `[]`.
pub fn quoted_list(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{item}'")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Per-question system prompt embedding the whole chart and the four
/// transformation stars of `horizon`.
pub fn master_prompt(
    question: &str,
    chart: &ChartData,
    target_year: i32,
    horizon: Horizon,
) -> String {
    let pan = &chart.astrolabe;
    let mutagens = chart.horoscope.mutagen_stars(horizon);
    if mutagens.is_empty() {
        log::warn!("no {} stem in chart, transformations omitted", horizon.label());
    }

    let chart_context = format!(
        "\n【命盘核心参数】\n命主：{} | 身主：{}\n当前流年：{target_year}年 | {}四化：{} (禄权科忌)\n",
        pan.soul(),
        pan.body(),
        horizon.label(),
        quoted_list(&mutagens)
    );

    let palaces: String = chart
        .palaces()
        .iter()
        .map(|p| render_palace(p, PalaceLayout::Pipe) + "│ │\n")
        .collect();

    format!(
        "{}# User Data\n{chart_context}\n\n【命盘十二宫】\n│ │\n{palaces}\n\n# Task\n用户问题：\"{question}\"\n\n{}",
        templates::MASTER_PREAMBLE,
        templates::RESPONSE_GUIDELINES
    )
}

/// Persona-only prompt for sessions without a chart.
pub fn default_system_prompt() -> String {
    templates::DEFAULT_SYSTEM_PROMPT.to_string()
}
