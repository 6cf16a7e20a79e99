pub mod api;
pub mod artifacts;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod git;
pub mod runner;
pub mod types;
pub mod upload;

pub use context::AppContext;
