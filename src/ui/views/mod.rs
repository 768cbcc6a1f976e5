mod assistant;
mod cache;
mod journal;
mod prayers;
mod qibla;

pub use assistant::AssistantView;
pub use cache::CacheView;
pub use journal::JournalView;
pub use prayers::PrayersView;
pub use qibla::QiblaView;
