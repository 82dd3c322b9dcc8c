pub mod cache;
pub use cache::{fingerprint, CachedChartService};

pub mod cases;
pub use cases::{CaseError, CaseStore, SavedCase};

pub mod chart_client;
pub use chart_client::{ChartRequest, ChartService, HttpChartClient};

pub mod error;
pub use error::ServiceError;

pub mod llm;
pub use llm::{
    stop_channel, ChatMessage, DeltaSink, LlmService, OpenAiCompatClient, Role, SseDecoder,
    SseEvent, StopHandle, StopSignal,
};

pub mod session;
pub use session::{AppState, SessionError, Workbench};

pub mod transcript;
pub use transcript::{Transcript, TranscriptError};
