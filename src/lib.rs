// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod error;
pub mod protocol;
pub mod state;
pub mod turn_clock;
pub mod types;
pub mod ws;
