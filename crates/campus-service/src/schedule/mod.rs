//! Class scheduling.
//!
//! - `recurrence`: pure expansion of a base interval into occurrences
//! - `time`: school-local wall clock to stored instants and back
//! - `batch`: concurrent, independent persistence of generated occurrences
//! - `service`: listing, preview, creation and single-slot edits

pub mod batch;
pub mod recurrence;
pub mod service;
pub mod time;
