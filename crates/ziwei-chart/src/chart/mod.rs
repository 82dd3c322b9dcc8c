pub mod data;
pub mod stars;
pub mod timeline;

pub use data::{
    AgeInfo, Astrolabe, ChartData, DecadalInfo, Horizon, Horoscope, HoroscopeItem, Palace, Star,
    NONE, UNKNOWN,
};
pub use stars::{important_stars, is_important, IMPORTANT_ADJECTIVE_STARS};
pub use timeline::{Decade, YearOption};
