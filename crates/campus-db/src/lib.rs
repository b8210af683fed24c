//! Persistence layer: schema, models and queries over PostgreSQL.

pub mod db;
pub mod error;
pub mod model;
