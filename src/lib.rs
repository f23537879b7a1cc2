// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod error;
pub mod prompts;
pub mod protocol;
pub mod quotes;
pub mod state;
pub mod strategy;
pub mod sweeper;
pub mod text;
pub mod types;
