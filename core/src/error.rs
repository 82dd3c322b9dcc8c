use thiserror::Error;

/// Failures talking to the chart service or the chat model.
///
/// None of these are retried. Each one is reported once to whoever triggered
/// the call, together with [`ServiceError::guidance`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("chart service unreachable at {url}")]
    ChartServiceUnavailable { url: String },

    #[error("{service} did not answer within {secs}s")]
    Timeout { service: &'static str, secs: u64 },

    #[error("{service} returned HTTP {status}: {body}")]
    HttpStatus {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("could not decode {service} response: {reason}")]
    Decode { service: &'static str, reason: String },

    #[error("no API key found in environment variable {env}")]
    MissingApiKey { env: String },

    #[error("{service} request failed: {reason}")]
    Request { service: &'static str, reason: String },
}

pub const CHART_SERVICE: &str = "chart service";
pub const LLM_SERVICE: &str = "language model";

impl ServiceError {
    /// Short user-facing hint on how to recover.
    pub fn guidance(&self) -> &'static str {
        match self {
            ServiceError::ChartServiceUnavailable { .. } => {
                "请先启动本地排盘服务: node src/server.js (或设置 ZIWEI_API_URL)"
            }
            ServiceError::Timeout { .. } => "服务响应超时，请稍后重试",
            ServiceError::HttpStatus { status, .. } if *status == 401 || *status == 403 => {
                "API 密钥无效或无权限，请检查密钥设置"
            }
            ServiceError::HttpStatus { .. } => "服务返回错误，请检查输入或服务日志",
            ServiceError::Decode { .. } => "服务返回的数据格式无法识别，请确认服务版本",
            ServiceError::MissingApiKey { .. } => "请设置 API 密钥环境变量 (默认 DASHSCOPE_API_KEY)",
            ServiceError::Request { .. } => "网络请求失败，请检查网络连接",
        }
    }

    pub(crate) fn from_reqwest(
        service: &'static str,
        url: &str,
        timeout_secs: u64,
        e: reqwest::Error,
    ) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout {
                service,
                secs: timeout_secs,
            }
        } else if e.is_connect() && service == CHART_SERVICE {
            ServiceError::ChartServiceUnavailable {
                url: url.to_string(),
            }
        } else if e.is_decode() {
            ServiceError::Decode {
                service,
                reason: e.to_string(),
            }
        } else {
            ServiceError::Request {
                service,
                reason: e.to_string(),
            }
        }
    }
}
