//! Integration tests against a real PostgreSQL database.

mod helpers;

mod access;
mod auth;
mod documents;
mod notifications;
mod schedule;
