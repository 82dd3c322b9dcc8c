//! Per-user application state and the handlers that advance it.
//!
//! `AppState` is plain data. Every user action derives a new state from the
//! old one; the [`Workbench`] only commits that new state once all network
//! calls for the action have succeeded.

use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use thiserror::Error;

use ziwei_chart::chart::timeline::{
    self, birth_year_from, current_nominal_age, decade_target_year, years_in_decade,
};
use ziwei_chart::prompt::{default_system_prompt, master_prompt, natal_prompt, GREETING};
use ziwei_chart::{
    BirthInput, CalendarError, ChartData, Decade, Horizon, SolarTimeResult, YearOption,
};

use crate::cases::SavedCase;
use crate::chart_client::{ChartRequest, ChartService};
use crate::error::ServiceError;
use crate::llm::{ChatMessage, DeltaSink, LlmService, StopSignal};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no chart loaded yet")]
    NoChart,
    #[error("decade {index} out of range ({available} available)")]
    DecadeOutOfRange { index: usize, available: usize },
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub birth: Option<BirthInput>,
    pub solar: Option<SolarTimeResult>,
    pub chart: Option<ChartData>,
    pub target_year: i32,
    pub horizon: Horizon,
    pub messages: Vec<ChatMessage>,
    pub model: String,
}

impl AppState {
    pub fn new(model: impl Into<String>, target_year: i32) -> Self {
        Self {
            birth: None,
            solar: None,
            chart: None,
            target_year,
            horizon: Horizon::Yearly,
            messages: Vec::new(),
            model: model.into(),
        }
    }

    /// A freshly computed chart: the conversation restarts with the natal
    /// context and the greeting.
    pub fn with_chart(
        self,
        birth: BirthInput,
        solar: SolarTimeResult,
        chart: ChartData,
        target_year: i32,
    ) -> Self {
        let context = natal_prompt(&chart, Some(&solar));
        Self {
            birth: Some(birth),
            solar: Some(solar),
            chart: Some(chart),
            target_year,
            horizon: Horizon::Yearly,
            messages: vec![
                ChatMessage::system(context.system),
                ChatMessage::system(context.data_context),
                ChatMessage::assistant(GREETING),
            ],
            ..self
        }
    }

    /// Same person, another fortune window. The chart is replaced wholesale
    /// and the conversation is kept.
    pub fn with_refetched_chart(
        self,
        chart: ChartData,
        target_year: i32,
        horizon: Horizon,
    ) -> Self {
        Self {
            chart: Some(chart),
            target_year,
            horizon,
            ..self
        }
    }

    pub fn with_user_message(mut self, text: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::user(text));
        self
    }

    pub fn with_assistant_reply(mut self, text: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::assistant(text));
        self
    }

    /// Replaces the conversation, e.g. with an imported transcript.
    pub fn with_messages(self, messages: Vec<ChatMessage>) -> Self {
        Self { messages, ..self }
    }

    pub fn with_model(self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self
        }
    }

    /// Messages sent to the model for `question`: a fresh system prompt
    /// followed by the visible conversation.
    pub fn llm_messages(&self, question: &str) -> Vec<ChatMessage> {
        let system = match &self.chart {
            Some(chart) => master_prompt(question, chart, self.target_year, self.horizon),
            None => default_system_prompt(),
        };
        std::iter::once(ChatMessage::system(system))
            .chain(self.messages.iter().filter(|m| !m.is_system()).cloned())
            .collect()
    }

    pub fn visible_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| !m.is_system())
    }

    pub fn nominal_age(&self, this_year: i32) -> Option<i32> {
        let chart = self.chart.as_ref()?;
        let birth_year = self.birth.as_ref().map(|b| b.year).unwrap_or(this_year);
        Some(current_nominal_age(chart, birth_year, this_year))
    }

    /// Birth year implied by the chart's age for the target year.
    pub fn birth_year(&self) -> Option<i32> {
        let chart = self.chart.as_ref()?;
        match chart.horoscope.nominal_age() {
            Some(age) => Some(birth_year_from(self.target_year, age)),
            None => self.birth.as_ref().map(|b| b.year),
        }
    }

    pub fn decades(&self) -> Vec<Decade> {
        self.chart.as_ref().map(timeline::decades).unwrap_or_default()
    }

    /// Years of the decade holding the target year.
    pub fn year_options(&self) -> Vec<YearOption> {
        let Some(birth_year) = self.birth_year() else {
            return Vec::new();
        };
        let decades = self.decades();
        let age = self.target_year - birth_year + 1;
        decades
            .get(timeline::selected_decade_index(&decades, age))
            .map(|d| years_in_decade(birth_year, d))
            .unwrap_or_default()
    }
}

/// Drives one session against a chart service and a chat model.
pub struct Workbench<C, L> {
    chart_service: C,
    llm: L,
    state: AppState,
    this_year: i32,
}

impl<C: ChartService, L: LlmService> Workbench<C, L> {
    pub fn new(chart_service: C, llm: L, state: AppState, this_year: i32) -> Self {
        Self {
            chart_service,
            llm,
            state,
            this_year,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn chart_service(&self) -> &C {
        &self.chart_service
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    pub fn into_state(self) -> AppState {
        self.state
    }

    pub fn set_state(&mut self, state: AppState) {
        self.state = state;
    }

    fn request(&self, target_year: i32) -> Result<ChartRequest, SessionError> {
        let birth = self.state.birth.as_ref().ok_or(SessionError::NoChart)?;
        Ok(ChartRequest::from_birth(birth, target_year)?)
    }

    /// New birth data: resolve the time slot, fetch the chart for the current
    /// year and restart the conversation.
    pub async fn submit(&mut self, birth: BirthInput) -> Result<&AppState, SessionError> {
        let solar = birth.resolve_time()?;
        let request = ChartRequest::from_birth(&birth, self.this_year)?;
        log::info!(
            "submitting {} {} slot {}",
            request.birthday,
            request.gender,
            request.hour_index
        );
        let chart = self.chart_service.fetch_chart(&request).await?;
        self.state = self
            .state
            .clone()
            .with_chart(birth, solar, chart, self.this_year);
        Ok(&self.state)
    }

    /// Switch to the decade at `index` of [`AppState::decades`]; the target
    /// year becomes the decade's first year.
    pub async fn select_decade(&mut self, index: usize) -> Result<&AppState, SessionError> {
        let decades = self.state.decades();
        let decade = decades.get(index).ok_or(SessionError::DecadeOutOfRange {
            index,
            available: decades.len(),
        })?;
        let birth_year = self.state.birth_year().ok_or(SessionError::NoChart)?;
        let target_year = decade_target_year(birth_year, decade);

        let chart = self
            .chart_service
            .fetch_chart(&self.request(target_year)?)
            .await?;
        self.state = self
            .state
            .clone()
            .with_refetched_chart(chart, target_year, Horizon::Decadal);
        Ok(&self.state)
    }

    /// Reopen a saved case without asking the chart service. The
    /// conversation restarts as after [`Workbench::submit`].
    pub fn restore_case(&mut self, case: &SavedCase) -> Result<&AppState, SessionError> {
        let solar = case.birth.resolve_time()?;
        let target_year = case.chart.target_year.unwrap_or(self.this_year);
        self.state = self.state.clone().with_chart(
            case.birth.clone(),
            solar,
            case.chart.clone(),
            target_year,
        );
        Ok(&self.state)
    }

    pub async fn select_year(&mut self, year: i32) -> Result<&AppState, SessionError> {
        let chart = self.chart_service.fetch_chart(&self.request(year)?).await?;
        self.state = self
            .state
            .clone()
            .with_refetched_chart(chart, year, Horizon::Yearly);
        Ok(&self.state)
    }

    /// Ask the model. The question and the answer are appended only when the
    /// stream completes without error. A stop through `stop` or the sink
    /// keeps the partial answer.
    pub async fn ask(
        &mut self,
        question: &str,
        stop: &StopSignal,
        sink: &mut DeltaSink<'_>,
    ) -> Result<String, SessionError> {
        let pending = self.state.clone().with_user_message(question);
        let messages = pending.llm_messages(question);
        let answer = self
            .llm
            .stream_chat(&pending.model, &messages, stop, sink)
            .await?;
        self.state = pending.with_assistant_reply(answer.clone());
        Ok(answer)
    }

    /// [`Workbench::ask`] without a live sink or stop signal.
    pub async fn ask_quietly(&mut self, question: &str) -> Result<String, SessionError> {
        let mut sink = |_: &str| ControlFlow::Continue(());
        self.ask(question, &StopSignal::never(), &mut sink).await
    }
}
