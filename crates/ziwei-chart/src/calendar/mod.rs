pub mod birth;
pub mod ganzhi;
pub mod mutagen;
pub mod slots;
pub mod solar_time;

pub use birth::{BirthInput, CalendarKind, Gender};
pub use ganzhi::{ganzhi_for_year, year_branch, year_stem, EARTHLY_BRANCHES, HEAVENLY_STEMS};
pub use mutagen::{mutagen_of_star, mutagens_for_stem, Mutagen};
pub use slots::{classify, TimeSlot};
pub use solar_time::{
    longitude_correction, solar_correction, true_solar_time, SolarCorrection, SolarTimeResult,
    DEFAULT_LONGITUDE,
};
