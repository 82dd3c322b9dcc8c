use async_trait::async_trait;
use std::ops::ControlFlow;
use std::sync::Mutex;

use ziwei_chart::{BirthInput, ChartData, Gender, Horizon, GREETING};
use ziwei_core::{
    stop_channel, AppState, ChartRequest, ChartService, ChatMessage, DeltaSink, LlmService, Role,
    ServiceError, SessionError, StopSignal, Workbench,
};

const SAMPLE_CHART: &str =
    include_str!("../../crates/ziwei-chart/tests/fixtures/sample_chart.json");

/// Serves the sample chart for any request and remembers what was asked.
#[derive(Default)]
struct FakeChartService {
    requests: Mutex<Vec<ChartRequest>>,
    fail: Mutex<bool>,
}

#[async_trait]
impl ChartService for FakeChartService {
    async fn fetch_chart(&self, request: &ChartRequest) -> Result<ChartData, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        if *self.fail.lock().unwrap() {
            return Err(ServiceError::ChartServiceUnavailable {
                url: "http://localhost:3000/api/ziwei".into(),
            });
        }
        let mut chart = ChartData::from_json(SAMPLE_CHART).unwrap();
        chart.target_year = Some(request.target_year);
        Ok(chart)
    }
}

/// Replies with a fixed answer split in two deltas and records the prompt.
#[derive(Default)]
struct FakeLlm {
    seen: Mutex<Vec<Vec<ChatMessage>>>,
    fail: bool,
}

#[async_trait]
impl LlmService for FakeLlm {
    async fn stream_chat(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        stop: &StopSignal,
        sink: &mut DeltaSink<'_>,
    ) -> Result<String, ServiceError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        if self.fail {
            return Err(ServiceError::MissingApiKey { env: "DASHSCOPE_API_KEY".into() });
        }
        let mut text = String::new();
        for delta in ["宜守", "不宜攻"] {
            if stop.is_stopped() {
                break;
            }
            text.push_str(delta);
            if sink(delta).is_break() {
                break;
            }
        }
        Ok(text)
    }
}

fn workbench(llm: FakeLlm) -> Workbench<FakeChartService, FakeLlm> {
    Workbench::new(
        FakeChartService::default(),
        llm,
        AppState::new("qwen3-max", 2026),
        2026,
    )
}

fn birth() -> BirthInput {
    BirthInput::solar(2000, 5, 23, 10, 50, Gender::Female)
}

#[tokio::test]
async fn test_submit_builds_natal_conversation() {
    let mut bench = workbench(FakeLlm::default());
    let state = bench.submit(birth()).await.unwrap();

    assert_eq!(state.target_year, 2026);
    assert_eq!(state.horizon, Horizon::Yearly);
    assert_eq!(state.solar.as_ref().unwrap().chinese_hour, "巳时");
    let roles: Vec<Role> = state.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::System, Role::Assistant]);
    assert!(state.messages[1].content.starts_with("【基本信息】"));
    assert_eq!(state.messages[2].content, GREETING);
}

#[tokio::test]
async fn test_failed_submit_keeps_previous_state() {
    let mut bench = workbench(FakeLlm::default());
    bench.submit(birth()).await.unwrap();
    let before = bench.state().clone();

    *bench_chart_fail(&bench) = true;
    let err = bench
        .submit(BirthInput::solar(1990, 1, 1, 8, 0, Gender::Male))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Service(ServiceError::ChartServiceUnavailable { .. })));
    assert_eq!(bench.state(), &before);
}

fn bench_chart_fail(
    bench: &Workbench<FakeChartService, FakeLlm>,
) -> std::sync::MutexGuard<'_, bool> {
    bench.chart_service().fail.lock().unwrap()
}

#[tokio::test]
async fn test_invalid_birth_input_is_rejected_before_fetch() {
    let mut bench = workbench(FakeLlm::default());
    let err = bench
        .submit(BirthInput::solar(2001, 2, 29, 8, 0, Gender::Male))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Calendar(_)));
    assert!(bench.chart_service().requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_select_decade_refetches_first_year() {
    let mut bench = workbench(FakeLlm::default());
    bench.submit(birth()).await.unwrap();
    let conversation = bench.state().messages.clone();

    // Decades sorted by start age: 2, 12, 22 ...
    let state = bench.select_decade(2).await.unwrap();
    assert_eq!(state.target_year, 2021);
    assert_eq!(state.horizon, Horizon::Decadal);
    assert_eq!(state.messages, conversation);

    let requests = bench.chart_service().requests.lock().unwrap();
    assert_eq!(requests.last().unwrap().target_year, 2021);
    assert_eq!(requests.last().unwrap().birthday, "2000-5-23");
}

#[tokio::test]
async fn test_select_decade_out_of_range() {
    let mut bench = workbench(FakeLlm::default());
    bench.submit(birth()).await.unwrap();
    assert_eq!(
        bench.select_decade(12).await.unwrap_err(),
        SessionError::DecadeOutOfRange { index: 12, available: 12 }
    );
}

#[tokio::test]
async fn test_select_year_without_chart() {
    let mut bench = workbench(FakeLlm::default());
    assert_eq!(bench.select_year(2030).await.unwrap_err(), SessionError::NoChart);
}

#[tokio::test]
async fn test_select_year_switches_to_yearly_horizon() {
    let mut bench = workbench(FakeLlm::default());
    bench.submit(birth()).await.unwrap();
    bench.select_decade(2).await.unwrap();
    let state = bench.select_year(2024).await.unwrap();
    assert_eq!(state.target_year, 2024);
    assert_eq!(state.horizon, Horizon::Yearly);
}

#[tokio::test]
async fn test_ask_sends_master_prompt_and_history() {
    let mut bench = workbench(FakeLlm::default());
    bench.submit(birth()).await.unwrap();

    let mut streamed = String::new();
    let mut sink = |delta: &str| {
        streamed.push_str(delta);
        ControlFlow::Continue(())
    };
    let answer = bench
        .ask("今年要注意什么？", &StopSignal::never(), &mut sink)
        .await
        .unwrap();
    assert_eq!(answer, "宜守不宜攻");
    assert_eq!(streamed, answer);

    let seen = bench.llm().seen.lock().unwrap();
    let prompt = &seen[0];
    assert_eq!(prompt.len(), 3);
    assert_eq!(prompt[0].role, Role::System);
    assert!(prompt[0].content.contains("用户问题：\"今年要注意什么？\""));
    assert!(prompt[0].content.contains("当前流年：2026年"));
    assert_eq!(prompt[1], ChatMessage::assistant(GREETING));
    assert_eq!(prompt[2], ChatMessage::user("今年要注意什么？"));

    let messages = &bench.state().messages;
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[4], ChatMessage::assistant("宜守不宜攻"));
}

#[tokio::test]
async fn test_ask_without_chart_uses_default_prompt() {
    let mut bench = workbench(FakeLlm::default());
    bench.ask_quietly("你好").await.unwrap();
    let seen = bench.llm().seen.lock().unwrap();
    assert!(seen[0][0].content.contains("由于没有提供具体的命盘数据"));
}

#[tokio::test]
async fn test_interrupted_answer_is_kept_partial() {
    let mut bench = workbench(FakeLlm::default());
    bench.submit(birth()).await.unwrap();
    let mut sink = |_: &str| ControlFlow::Break(());
    let answer = bench.ask("?", &StopSignal::never(), &mut sink).await.unwrap();
    assert_eq!(answer, "宜守");
    assert_eq!(bench.state().messages.last().unwrap().content, "宜守");
}

#[tokio::test]
async fn test_stop_signal_keeps_partial_answer() {
    let mut bench = workbench(FakeLlm::default());
    bench.submit(birth()).await.unwrap();
    let (handle, signal) = stop_channel();
    // Stop arrives while the first delta is being shown.
    let mut sink = move |_: &str| {
        handle.stop();
        ControlFlow::Continue(())
    };
    let answer = bench.ask("?", &signal, &mut sink).await.unwrap();
    assert_eq!(answer, "宜守");

    let messages = &bench.state().messages;
    assert_eq!(messages[messages.len() - 2], ChatMessage::user("?"));
    assert_eq!(messages[messages.len() - 1], ChatMessage::assistant("宜守"));
}

#[tokio::test]
async fn test_failed_ask_leaves_conversation_untouched() {
    let mut bench = workbench(FakeLlm { fail: true, ..Default::default() });
    bench.submit(birth()).await.unwrap();
    let before = bench.state().messages.clone();
    assert!(bench.ask_quietly("?").await.is_err());
    assert_eq!(bench.state().messages, before);
}

#[test]
fn test_year_options_follow_target_year() {
    let chart = ChartData::from_json(SAMPLE_CHART).unwrap();
    let solar = birth().resolve_time().unwrap();
    let state = AppState::new("qwen3-max", 2026).with_chart(birth(), solar, chart, 2026);

    assert_eq!(state.birth_year(), Some(2000));
    let years = state.year_options();
    assert_eq!(years.first().unwrap().year, 2021);
    assert_eq!(years.last().unwrap().year, 2030);
}
