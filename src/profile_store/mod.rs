mod file_profile_store;
mod models;
mod trait_def;

pub use file_profile_store::FileProfileStore;
pub use models::{ListeningEntry, MoodEntry, RecommendationEntry, UserProfile};
pub use trait_def::ProfileStore;
