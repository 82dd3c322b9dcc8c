use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::llm::ChatMessage;
use crate::session::AppState;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("transcript I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("transcript is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Saved conversation. System messages are never exported since they are
/// rebuilt from the chart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Transcript {
    pub birth_date: String,
    pub gender: String,
    pub messages: Vec<ChatMessage>,
    pub timestamp: String,
}

impl Transcript {
    pub fn from_state<Tz: TimeZone>(state: &AppState, now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            birth_date: state.birth.as_ref().map(|b| b.birthday()).unwrap_or_default(),
            gender: state
                .birth
                .as_ref()
                .map(|b| b.gender.as_str().to_string())
                .unwrap_or_default(),
            messages: state.visible_messages().cloned().collect(),
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn capture(state: &AppState) -> Self {
        Self::from_state(state, &Local::now())
    }

    pub fn to_json(&self) -> Result<String, TranscriptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, TranscriptError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), TranscriptError> {
        fs::write(path, self.to_json()?)?;
        log::info!("saved {} messages to {}", self.messages.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, TranscriptError> {
        let text = fs::read_to_string(path)?;
        let transcript = Self::from_json(&text)?;
        log::info!("loaded {} messages from {}", transcript.messages.len(), path.display());
        Ok(transcript)
    }
}

/// `ziwei_chat_YYYYmmdd_HHMMSS.json`
pub fn default_filename<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("ziwei_chat_{}.json", now.format("%Y%m%d_%H%M%S"))
}
