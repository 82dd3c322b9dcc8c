//! Client for the external chart service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use ziwei_chart::{BirthInput, CalendarError, ChartData};
use ziwei_config::ChartServiceSettings;

use crate::error::{ServiceError, CHART_SERVICE};

/// Body of `POST /api/ziwei`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    /// `YYYY-M-D`, solar or lunar depending on `is_lunar`.
    pub birthday: String,
    pub hour_index: u8,
    pub gender: String,
    pub is_lunar: bool,
    pub is_leap: bool,
    pub target_year: i32,
}

impl ChartRequest {
    pub fn from_birth(birth: &BirthInput, target_year: i32) -> Result<Self, CalendarError> {
        Ok(Self {
            birthday: birth.birthday(),
            hour_index: birth.hour_index()?,
            gender: birth.gender.as_str().to_string(),
            is_lunar: birth.is_lunar(),
            is_leap: birth.is_lunar() && birth.is_leap,
            target_year,
        })
    }

    pub fn with_target_year(&self, target_year: i32) -> Self {
        Self {
            target_year,
            ..self.clone()
        }
    }
}

#[async_trait]
pub trait ChartService: Send + Sync {
    async fn fetch_chart(&self, request: &ChartRequest) -> Result<ChartData, ServiceError>;
}

/// Plain HTTP client. One attempt per call, bounded by the configured timeout.
pub struct HttpChartClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpChartClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Request {
                service: CHART_SERVICE,
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn from_settings(settings: &ChartServiceSettings) -> Result<Self, ServiceError> {
        Self::new(settings.url.clone(), settings.timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_err(&self, e: reqwest::Error) -> ServiceError {
        ServiceError::from_reqwest(CHART_SERVICE, &self.url, self.timeout.as_secs(), e)
    }
}

#[async_trait]
impl ChartService for HttpChartClient {
    async fn fetch_chart(&self, request: &ChartRequest) -> Result<ChartData, ServiceError> {
        log::debug!(
            "POST {} birthday={} hourIndex={} targetYear={}",
            self.url,
            request.birthday,
            request.hour_index,
            request.target_year
        );

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("chart service answered {status}");
            return Err(ServiceError::HttpStatus {
                service: CHART_SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(|e| self.map_err(e))?;
        ChartData::from_json(&text).map_err(|e| ServiceError::Decode {
            service: CHART_SERVICE,
            reason: e.to_string(),
        })
    }
}
