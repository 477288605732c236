pub mod cache;
pub mod config;
pub mod core;
pub mod orchestrator;
pub mod types;
