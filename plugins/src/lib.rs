pub mod auth;
pub mod factory;
pub mod git;
pub mod services;
pub mod upload;
