//! Business logic between the HTTP handlers and the persistence layer.
//!
//! ## Module Organization
//!
//! - `auth`: passwords, tokens, sessions, Casbin enforcement and depot helpers
//! - `schedule`: the recurring slot generator and batch persistence
//! - `user`, `student`, `formation`, `course`, `document`, `notification`:
//!   per-resource operations with their ownership rules

pub mod auth;
pub mod course;
pub mod document;
pub mod error;
pub mod formation;
pub mod notification;
pub mod patch;
pub mod schedule;
pub mod student;
pub mod user;
