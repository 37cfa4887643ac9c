pub mod types;
pub mod config;
pub mod context;
pub mod cancel;
pub mod engine;
pub mod error;
