//! Interactive consultation loop on top of a [`Workbench`].

use anyhow::Context;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use ziwei_chart::{GridRenderer, CSS_STYLE};
use ziwei_config::Settings;
use ziwei_core::transcript::default_filename;
use ziwei_core::{
    stop_channel, CachedChartService, CaseStore, ChartService, HttpChartClient, LlmService,
    OpenAiCompatClient, SessionError, StopHandle, StopSignal, Transcript, Workbench,
};

pub(crate) type CliWorkbench = Workbench<CachedChartService<HttpChartClient>, OpenAiCompatClient>;

const HELP: &str = "\
/decades          list the decades of the chart
/decade <n>       switch to decade n (from /decades)
/years            list the years of the current decade
/year <yyyy>      switch to a single year
/model [name]     show or change the model
/html <file>      write the chart grid as HTML
/save [file]      export the conversation
/load <file>      import a conversation
/cases            list saved cases
/case save <name> save the current birth data and chart
/case load <id>   reopen a saved case
/case delete <id> delete a saved case
/quit             leave
Anything else is sent as a question. Ctrl-C stops a running answer.";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Ask(String),
    Decades,
    Decade(usize),
    Years,
    Year(i32),
    Model(Option<String>),
    Html(PathBuf),
    Save(Option<PathBuf>),
    Load(PathBuf),
    Cases,
    CaseSave(String),
    CaseLoad(String),
    CaseDelete(String),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };
        match (name, arg) {
            ("decades", None) => Command::Decades,
            ("decade", Some(n)) => n
                .parse()
                .map(Command::Decade)
                .unwrap_or_else(|_| Command::Invalid(format!("not a decade index: {n}"))),
            ("years", None) => Command::Years,
            ("year", Some(y)) => y
                .parse()
                .map(Command::Year)
                .unwrap_or_else(|_| Command::Invalid(format!("not a year: {y}"))),
            ("model", arg) => Command::Model(arg.map(str::to_string)),
            ("html", Some(path)) => Command::Html(PathBuf::from(path)),
            ("save", arg) => Command::Save(arg.map(PathBuf::from)),
            ("load", Some(path)) => Command::Load(PathBuf::from(path)),
            ("cases", None) => Command::Cases,
            ("case", Some(arg)) => Self::parse_case(arg),
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            _ => Command::Invalid(format!("unknown command: {line}")),
        }
    }

    fn parse_case(arg: &str) -> Self {
        let (action, rest) = match arg.split_once(char::is_whitespace) {
            Some((action, rest)) => (action, rest.trim()),
            None => (arg, ""),
        };
        match (action, rest) {
            (_, "") => Command::Invalid(format!("/case {arg} needs an argument")),
            ("save", name) => Command::CaseSave(name.to_string()),
            ("load", id) => Command::CaseLoad(id.to_string()),
            ("delete", id) => Command::CaseDelete(id.to_string()),
            _ => Command::Invalid(format!("unknown case action: {action}")),
        }
    }
}

pub(crate) fn write_html(path: &Path, body: &str) -> anyhow::Result<()> {
    let page = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">{CSS_STYLE}</head><body>{body}</body></html>\n"
    );
    std::fs::write(path, page).with_context(|| format!("Failed to write {}", path.display()))
}

fn report(err: &SessionError) {
    eprintln!("[ziwei] {err}");
    if let SessionError::Service(service) = err {
        eprintln!("[ziwei] {}", service.guidance());
    }
}

fn print_conversation<C: ChartService, L: LlmService>(bench: &Workbench<C, L>) {
    for message in bench.state().visible_messages() {
        println!("[{}] {}\n", message.role, message.content);
    }
}

/// Streams one answer to stdout. Returns once the stream ends, fails or is
/// stopped through `stop`.
async fn ask(
    bench: &mut CliWorkbench,
    question: &str,
    stop: &StopHandle,
    signal: &StopSignal,
    streaming: &AtomicBool,
) {
    stop.reset();
    streaming.store(true, Ordering::SeqCst);
    let mut sink = |delta: &str| {
        print!("{delta}");
        std::io::stdout().flush().ok();
        ControlFlow::Continue(())
    };
    let result = bench.ask(question, signal, &mut sink).await;
    streaming.store(false, Ordering::SeqCst);
    println!();
    match result {
        Ok(_) if signal.is_stopped() => println!("[interrupted]"),
        Ok(_) => {}
        Err(e) => report(&e),
    }
}

fn save_case(bench: &CliWorkbench, cases: &mut CaseStore, name: &str) {
    let state = bench.state();
    let (Some(birth), Some(chart)) = (state.birth.clone(), state.chart.clone()) else {
        eprintln!("[ziwei] no chart to save");
        return;
    };
    match cases.add(name, birth, chart, &chrono::Local::now()) {
        Ok(case) => println!("saved case {} ({})", case.id, case.name),
        Err(e) => eprintln!("[ziwei] {e}"),
    }
}

pub(crate) async fn run(
    mut bench: CliWorkbench,
    settings: &Settings,
    mut cases: CaseStore,
) -> anyhow::Result<()> {
    let (stop, signal) = stop_channel();
    let stop = Arc::new(stop);
    let streaming = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        let streaming = Arc::clone(&streaming);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !streaming.load(Ordering::SeqCst) {
                    std::process::exit(130);
                }
                stop.stop();
            }
        });
    }

    print_conversation(&bench);
    println!("(/help for commands)");

    let grid = GridRenderer::with_settings(settings.grid.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Ask(question) => ask(&mut bench, &question, &stop, &signal, &streaming).await,
            Command::Decades => {
                let state = bench.state();
                let age = state.chart.as_ref().and_then(|c| c.horoscope.nominal_age());
                for (i, decade) in state.decades().iter().enumerate() {
                    let marker = if age.is_some_and(|a| decade.contains(a)) { "*" } else { " " };
                    println!("{marker}{i:>2}  {}", decade.label());
                }
            }
            Command::Decade(index) => match bench.select_decade(index).await {
                Ok(state) => {
                    println!("target year {} ({})", state.target_year, state.horizon.label())
                }
                Err(e) => report(&e),
            },
            Command::Years => {
                let target = bench.state().target_year;
                for option in bench.state().year_options() {
                    let marker = if option.year == target { "*" } else { " " };
                    println!("{marker} {}  {}岁", option.label(), option.nominal_age);
                }
            }
            Command::Year(year) => match bench.select_year(year).await {
                Ok(state) => {
                    println!("target year {} ({})", state.target_year, state.horizon.label())
                }
                Err(e) => report(&e),
            },
            Command::Model(None) => {
                for model in &settings.llm.models {
                    let marker = if *model == bench.state().model { "*" } else { " " };
                    println!("{marker} {model}");
                }
            }
            Command::Model(Some(model)) => {
                if !settings.llm.models.contains(&model) {
                    eprintln!("[ziwei] unknown model {model}; see /model");
                    continue;
                }
                let state = bench.state().clone().with_model(model);
                bench.set_state(state);
            }
            Command::Html(path) => {
                let state = bench.state();
                match write_html(&path, &grid.render(state.chart.as_ref(), state.solar.as_ref())) {
                    Ok(()) => println!("wrote {}", path.display()),
                    Err(e) => eprintln!("[ziwei] {e:#}"),
                }
            }
            Command::Save(path) => {
                let path = path
                    .unwrap_or_else(|| PathBuf::from(default_filename(&chrono::Local::now())));
                match Transcript::capture(bench.state()).save(&path) {
                    Ok(()) => println!("saved {}", path.display()),
                    Err(e) => eprintln!("[ziwei] {e}"),
                }
            }
            Command::Load(path) => match Transcript::load(&path) {
                Ok(transcript) => {
                    let state = bench.state().clone().with_messages(transcript.messages);
                    bench.set_state(state);
                    print_conversation(&bench);
                }
                Err(e) => eprintln!("[ziwei] {e}"),
            },
            Command::Cases => {
                if cases.cases().is_empty() {
                    println!("no saved cases in {}", cases.path().display());
                }
                for case in cases.cases() {
                    println!("{}", case.summary());
                }
            }
            Command::CaseSave(name) => save_case(&bench, &mut cases, &name),
            Command::CaseLoad(id) => match cases.get(&id) {
                Some(case) => match bench.restore_case(case) {
                    Ok(state) => {
                        println!("reopened {} (target year {})", case.name, state.target_year);
                        print_conversation(&bench);
                    }
                    Err(e) => report(&e),
                },
                None => eprintln!("[ziwei] no case {id}; see /cases"),
            },
            Command::CaseDelete(id) => match cases.remove(&id) {
                Ok(Some(case)) => println!("deleted {}", case.name),
                Ok(None) => eprintln!("[ziwei] no case {id}; see /cases"),
                Err(e) => eprintln!("[ziwei] {e}"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Invalid(reason) => eprintln!("[ziwei] {reason}"),
        }
    }
    Ok(())
}
