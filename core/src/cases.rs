//! Named birth cases kept in a JSON file, so a chart can be reopened without
//! asking the chart service again.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use ziwei_chart::{BirthInput, ChartData};

use crate::transcript::TIMESTAMP_FORMAT;

#[derive(Error, Debug)]
pub enum CaseError {
    #[error("case store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("case store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("case name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCase {
    pub id: String,
    pub name: String,
    #[serde(rename = "birthData")]
    pub birth: BirthInput,
    #[serde(rename = "ziweiData")]
    pub chart: ChartData,
    pub saved_at: String,
}

impl SavedCase {
    /// One-line summary for listings.
    pub fn summary(&self) -> String {
        format!(
            "{}  {}  {} {}  ({})",
            self.id,
            self.name,
            self.birth.birthday(),
            self.birth.gender,
            self.saved_at
        )
    }
}

/// Every change is written through to `path` immediately.
#[derive(Debug)]
pub struct CaseStore {
    path: PathBuf,
    cases: Vec<SavedCase>,
}

impl CaseStore {
    /// Opens the store at `path`. A missing file is an empty store; an
    /// unreadable one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CaseError> {
        let path = path.into();
        let cases = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable case store {}: {e}", path.display());
                Vec::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, cases })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cases(&self) -> &[SavedCase] {
        &self.cases
    }

    pub fn get(&self, id: &str) -> Option<&SavedCase> {
        self.cases.iter().find(|c| c.id == id)
    }

    fn next_id(&self) -> String {
        let last = self
            .cases
            .iter()
            .filter_map(|c| c.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (last + 1).to_string()
    }

    pub fn add<Tz: TimeZone>(
        &mut self,
        name: &str,
        birth: BirthInput,
        chart: ChartData,
        now: &DateTime<Tz>,
    ) -> Result<&SavedCase, CaseError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(CaseError::EmptyName);
        }
        let case = SavedCase {
            id: self.next_id(),
            name: name.to_string(),
            birth,
            chart,
            saved_at: now.format(TIMESTAMP_FORMAT).to_string(),
        };
        let mut cases = self.cases.clone();
        cases.push(case);
        self.write(&cases)?;
        self.cases = cases;
        log::info!("saved case {} to {}", name, self.path.display());
        Ok(&self.cases[self.cases.len() - 1])
    }

    /// Removes the case with `id`; `Ok(None)` when there is none.
    pub fn remove(&mut self, id: &str) -> Result<Option<SavedCase>, CaseError> {
        let Some(pos) = self.cases.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let mut cases = self.cases.clone();
        let removed = cases.remove(pos);
        self.write(&cases)?;
        self.cases = cases;
        Ok(Some(removed))
    }

    fn write(&self, cases: &[SavedCase]) -> Result<(), CaseError> {
        fs::write(&self.path, serde_json::to_string_pretty(cases)?)?;
        Ok(())
    }
}
