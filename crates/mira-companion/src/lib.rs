//! Clients for the hosted language and voice models, plus the prompts MIRA
//! sends them and the parsers for what comes back.

pub mod anthropic;
pub mod error;
pub mod prompts;
pub mod speech;

pub use anthropic::ChatClient;
pub use error::CompanionError;
pub use speech::SpeechClient;
