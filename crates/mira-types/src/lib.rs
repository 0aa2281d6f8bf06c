pub mod api;
pub mod models;

pub use models::{Dream, Message, Mood, MoodEntry, Role, User};
