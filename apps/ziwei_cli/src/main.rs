mod birth_args;
mod chat;

use anyhow::Context;
use chrono::Datelike;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use birth_args::{parse_clock, parse_date, BirthArgs};
use ziwei_chart::calendar::{ganzhi_for_year, mutagens_for_stem, true_solar_time, year_stem};
use ziwei_chart::{master_prompt, natal_prompt, GridRenderer, Horizon};
use ziwei_config::Settings;
use ziwei_core::{
    AppState, CachedChartService, CaseStore, ChartRequest, ChartService, HttpChartClient,
    OpenAiCompatClient, SessionError, Transcript, Workbench,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Zi Wei Dou Shu charts and consultations")]
struct Args {
    /// Config file (default: configs/ziwei.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a clock reading to true solar time and its slot.
    Solar {
        /// Date as YYYY-M-D.
        #[arg(long)]
        date: String,
        /// Clock time as HH:MM.
        #[arg(long)]
        time: String,
        #[arg(long)]
        longitude: Option<f64>,
    },
    /// Stem-branch name and transformation stars of one or more years.
    Ganzhi {
        #[arg(required = true)]
        years: Vec<i32>,
    },
    /// Fetch a chart and print its decades, prompts or HTML grid.
    Chart {
        #[command(flatten)]
        birth: BirthArgs,
        /// Year the fortune windows refer to (default: this year).
        #[arg(long)]
        target_year: Option<i32>,
        /// Write the chart grid as an HTML page.
        #[arg(long)]
        html: Option<PathBuf>,
        /// Print the natal context and the consultation prompt.
        #[arg(long)]
        prompt: bool,
        /// Question embedded in the consultation prompt.
        #[arg(long, default_value = "请整体分析我的命盘")]
        question: String,
        /// Dump the raw chart JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive consultation.
    Chat {
        #[command(flatten)]
        birth: BirthArgs,
        /// Model to start with (default from config).
        #[arg(long)]
        model: Option<String>,
        /// Resume a saved conversation.
        #[arg(long)]
        load: Option<PathBuf>,
    },
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => ziwei_config::load_settings_from(path),
        None => ziwei_config::load_settings(),
    }
}

fn chart_service(settings: &Settings) -> anyhow::Result<CachedChartService<HttpChartClient>> {
    let client = HttpChartClient::from_settings(&settings.chart_service)
        .context("Failed to build chart service client")?;
    log::info!("chart service at {}", client.url());
    Ok(CachedChartService::new(client, settings.chart_service.cache_ttl))
}

fn session_failure(err: SessionError) -> anyhow::Error {
    match &err {
        SessionError::Service(service) => anyhow::anyhow!("{err}\n{}", service.guidance()),
        _ => anyhow::Error::new(err),
    }
}

fn run_solar(date: &str, time: &str, longitude: f64) -> anyhow::Result<()> {
    let (year, month, day) = parse_date(date)?;
    let (hour, minute) = parse_clock(time)?;
    let result = true_solar_time(year, month, day, hour, minute, longitude)?;
    println!("钟表时间: {}", result.clock_time);
    println!("真太阳时: {}", result.true_solar_time);
    println!("经度: {:.3}°E", result.longitude);
    println!("时差: {}", result.time_difference);
    println!("时辰: {} (index {})", result.chinese_hour, result.chinese_hour_index);
    Ok(())
}

fn run_ganzhi(years: &[i32]) {
    for &year in years {
        let stars: Vec<&str> = mutagens_for_stem(year_stem(year)).into_values().collect();
        println!("{year} {} 四化: {}", ganzhi_for_year(year), stars.join(" "));
    }
}

async fn run_chart(
    settings: &Settings,
    birth: &BirthArgs,
    target_year: i32,
    html: Option<PathBuf>,
    prompt: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let input = birth.to_input(settings.default_longitude)?;
    let solar = input.resolve_time()?;
    let request = ChartRequest::from_birth(&input, target_year)?;
    let chart = chart_service(settings)?
        .fetch_chart(&request)
        .await
        .map_err(|e| session_failure(e.into()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    }

    println!("{} {} {}", input.birthday(), solar.chinese_hour, input.gender);
    let age = chart.horoscope.nominal_age();
    for decade in ziwei_chart::chart::timeline::decades(&chart) {
        let marker = if age.is_some_and(|a| decade.contains(a)) { "*" } else { " " };
        println!("{marker} {}", decade.label());
    }

    if let Some(question) = prompt {
        let context = natal_prompt(&chart, Some(&solar));
        println!("\n{}\n", context.data_context);
        println!("{}", master_prompt(question, &chart, target_year, Horizon::Yearly));
    }

    if let Some(path) = html {
        let grid = GridRenderer::with_settings(settings.grid.clone());
        chat::write_html(&path, &grid.render(Some(&chart), Some(&solar)))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

async fn run_chat(
    settings: &Settings,
    birth: &BirthArgs,
    model: Option<String>,
    load: Option<PathBuf>,
    this_year: i32,
) -> anyhow::Result<()> {
    let model = model.unwrap_or_else(|| settings.llm.model.clone());
    if !settings.llm.models.contains(&model) {
        anyhow::bail!("Unknown model {model} (configured: {})", settings.llm.models.join(", "));
    }

    let llm = OpenAiCompatClient::from_settings(&settings.llm)
        .context("Failed to build language model client")?;
    if settings.llm.api_key().is_none() {
        log::warn!("{} is not set; questions will fail", settings.llm.api_key_env);
    }

    let mut bench = Workbench::new(
        chart_service(settings)?,
        llm,
        AppState::new(model, this_year),
        this_year,
    );
    bench
        .submit(birth.to_input(settings.default_longitude)?)
        .await
        .map_err(session_failure)?;

    if let Some(path) = load {
        let transcript = Transcript::load(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let state = bench.state().clone().with_messages(transcript.messages);
        bench.set_state(state);
    }

    let cases = CaseStore::open(&settings.cases_file)
        .with_context(|| format!("Failed to open {}", settings.cases_file.display()))?;
    chat::run(bench, settings, cases).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let settings = load_settings(args.config.as_ref())?;
    let this_year = chrono::Local::now().year();

    match args.command {
        Command::Solar { date, time, longitude } => {
            run_solar(&date, &time, longitude.unwrap_or(settings.default_longitude))
        }
        Command::Ganzhi { years } => {
            run_ganzhi(&years);
            Ok(())
        }
        Command::Chart {
            birth,
            target_year,
            html,
            prompt,
            question,
            json,
        } => {
            let question = prompt.then_some(question.as_str());
            let target_year = target_year.unwrap_or(this_year);
            run_chart(&settings, &birth, target_year, html, question, json).await
        }
        Command::Chat { birth, model, load } => {
            run_chat(&settings, &birth, model, load, this_year).await
        }
    }
}
