//! Shared configuration, constants, error and policy types for the campus server.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
