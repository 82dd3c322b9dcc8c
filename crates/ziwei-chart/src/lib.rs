pub mod calendar;
pub mod chart;
pub mod error;
pub mod prompt;
pub mod rendering;

pub use calendar::{BirthInput, CalendarKind, Gender, Mutagen, SolarTimeResult, TimeSlot};
pub use chart::{ChartData, Decade, Horizon, YearOption};
pub use error::CalendarError;
pub use prompt::{default_system_prompt, master_prompt, natal_prompt, PromptContext, GREETING};
pub use rendering::{render_html_grid, GridRenderer, GridSettings, CSS_STYLE};
