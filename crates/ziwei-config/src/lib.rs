use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ziwei_chart::calendar::solar_time::DEFAULT_LONGITUDE;
use ziwei_chart::rendering::GridSettings;

pub const DEFAULT_CHART_SERVICE_URL: &str = "http://localhost:3000/api/ziwei";
pub const DEFAULT_LLM_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_API_KEY_ENV: &str = "DASHSCOPE_API_KEY";
pub const DEFAULT_CASES_FILE: &str = "ziwei_cases.json";

const MAX_TIMEOUT_SECS: u64 = 9;

const CONFIG_PATHS: [&str; 2] = ["configs/ziwei.toml", "../../configs/ziwei.toml"];

#[derive(Debug, Clone, PartialEq)]
pub struct ChartServiceSettings {
    pub url: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    /// Models offered for selection; `model` is always among them.
    pub models: Vec<String>,
    pub temperature: f32,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two streamed chunks.
    pub chunk_timeout: Duration,
}

impl LlmSettings {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub chart_service: ChartServiceSettings,
    pub llm: LlmSettings,
    pub default_longitude: f64,
    pub grid: GridSettings,
    /// JSON file holding saved birth cases.
    pub cases_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartServiceToml {
    #[serde(default = "default_chart_service_url")]
    url: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct LlmToml {
    #[serde(default = "default_llm_base_url")]
    base_url: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default = "default_models")]
    models: Vec<String>,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    connect_timeout_secs: u64,
    #[serde(default = "default_chunk_timeout_secs")]
    chunk_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct BirthToml {
    #[serde(default = "default_longitude")]
    longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct CasesToml {
    #[serde(default = "default_cases_file")]
    file: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RootConfigToml {
    #[serde(default)]
    chart_service: Option<ChartServiceToml>,
    #[serde(default)]
    llm: Option<LlmToml>,
    #[serde(default)]
    birth: Option<BirthToml>,
    #[serde(default)]
    grid: Option<GridSettings>,
    #[serde(default)]
    cases: Option<CasesToml>,
}

fn default_chart_service_url() -> String {
    DEFAULT_CHART_SERVICE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    8
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_llm_base_url() -> String {
    DEFAULT_LLM_BASE_URL.to_string()
}

fn default_models() -> Vec<String> {
    ["qwen3-max", "deepseek-v3.2", "glm-4.7", "kimi-k2.5"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_chunk_timeout_secs() -> u64 {
    30
}

fn default_cases_file() -> PathBuf {
    PathBuf::from(DEFAULT_CASES_FILE)
}

fn default_longitude() -> f64 {
    DEFAULT_LONGITUDE
}

impl Default for Settings {
    fn default() -> Self {
        // An empty document resolves every field to its default.
        from_root(RootConfigToml::default())
    }
}

fn from_root(root: RootConfigToml) -> Settings {
    let chart = root.chart_service.unwrap_or(ChartServiceToml {
        url: default_chart_service_url(),
        timeout_secs: default_timeout_secs(),
        cache_ttl_secs: default_cache_ttl_secs(),
    });
    let llm = root.llm.unwrap_or(LlmToml {
        base_url: default_llm_base_url(),
        model: None,
        models: default_models(),
        temperature: default_temperature(),
        api_key_env: default_api_key_env(),
        connect_timeout_secs: default_timeout_secs(),
        chunk_timeout_secs: default_chunk_timeout_secs(),
    });

    let mut models = llm.models;
    let model = match llm.model {
        Some(model) => model,
        None => models.first().cloned().unwrap_or_else(|| "qwen3-max".to_string()),
    };
    if !models.contains(&model) {
        models.insert(0, model.clone());
    }

    Settings {
        chart_service: ChartServiceSettings {
            url: chart.url,
            timeout: Duration::from_secs(chart.timeout_secs),
            cache_ttl: Duration::from_secs(chart.cache_ttl_secs),
        },
        llm: LlmSettings {
            base_url: llm.base_url,
            model,
            models,
            temperature: llm.temperature,
            api_key_env: llm.api_key_env,
            connect_timeout: Duration::from_secs(llm.connect_timeout_secs),
            chunk_timeout: Duration::from_secs(llm.chunk_timeout_secs),
        },
        default_longitude: root.birth.map(|b| b.longitude).unwrap_or(DEFAULT_LONGITUDE),
        grid: root.grid.unwrap_or_default(),
        cases_file: root.cases.map(|c| c.file).unwrap_or_else(default_cases_file),
    }
}

/// Try the usual relative locations of `configs/ziwei.toml`.
pub fn read_config_toml_text() -> anyhow::Result<String> {
    for p in &CONFIG_PATHS {
        if let Ok(c) = fs::read_to_string(p) {
            return Ok(c);
        }
    }
    anyhow::bail!("Could not load ziwei.toml from {:?}", CONFIG_PATHS);
}

/// Network timeouts are single-digit seconds.
fn check_timeout(key: &str, timeout: Duration) -> anyhow::Result<()> {
    let secs = timeout.as_secs();
    if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
        anyhow::bail!("{key} must lie in 1..={MAX_TIMEOUT_SECS}, got {secs}");
    }
    Ok(())
}

pub fn parse_settings(text: &str) -> anyhow::Result<Settings> {
    let root: RootConfigToml = toml::from_str(text)
        .map_err(|e| anyhow::anyhow!("Failed to parse ziwei.toml: {e}"))?;
    let settings = from_root(root);
    check_timeout("chart_service.timeout_secs", settings.chart_service.timeout)?;
    check_timeout("llm.connect_timeout_secs", settings.llm.connect_timeout)?;
    if !(0.0..=2.0).contains(&settings.llm.temperature) {
        anyhow::bail!(
            "llm.temperature must lie in 0.0..=2.0, got {}",
            settings.llm.temperature
        );
    }
    Ok(settings)
}

/// Overrides taken from the process environment: `ZIWEI_API_URL`,
/// `ZIWEI_LLM_BASE_URL` and `ZIWEI_LLM_MODEL`.
pub fn apply_env_overrides<F>(mut settings: Settings, lookup: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    if let Some(url) = lookup("ZIWEI_API_URL") {
        log::debug!("chart service url overridden by ZIWEI_API_URL");
        settings.chart_service.url = url;
    }
    if let Some(url) = lookup("ZIWEI_LLM_BASE_URL") {
        settings.llm.base_url = url;
    }
    if let Some(model) = lookup("ZIWEI_LLM_MODEL") {
        if !settings.llm.models.contains(&model) {
            settings.llm.models.insert(0, model.clone());
        }
        settings.llm.model = model;
    }
    settings
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let settings = parse_settings(&text)?;
    Ok(apply_env_overrides(settings, |key| std::env::var(key).ok()))
}

/// Settings from `configs/ziwei.toml` when present, defaults otherwise, with
/// environment overrides applied last.
pub fn load_settings() -> anyhow::Result<Settings> {
    let settings = match read_config_toml_text() {
        Ok(text) => parse_settings(&text)?,
        Err(e) => {
            log::info!("{e}; using built-in defaults");
            Settings::default()
        }
    };
    Ok(apply_env_overrides(settings, |key| std::env::var(key).ok()))
}
