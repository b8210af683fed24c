//! Persistence of a generated series.
//!
//! Every occurrence is written by its own insert on its own pooled
//! connection, all in flight at once. There is no transaction across the
//! set: successful rows stay when others fail, and failures are only counted.

use std::fmt::Display;
use std::future::Future;

use futures::future::join_all;
use serde::Serialize;
use tracing_futures::Instrument;

use campus_core::constants::BATCH_FAILURE_SUFFIX;

/// Aggregate result of a recurring creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome<T> {
    pub created: Vec<T>,
    /// Occurrences asked for after count clamping.
    pub requested: u32,
    /// Occurrences the generator could not place.
    pub skipped: u32,
    /// Occurrences whose insert failed.
    pub failed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> BatchOutcome<T> {
    #[must_use]
    pub fn new(created: Vec<T>, requested: u32, skipped: u32, failed: u32) -> Self {
        Self {
            message: failure_message(failed),
            created,
            requested,
            skipped,
            failed,
        }
    }

    /// Whether at least one slot was stored.
    #[must_use]
    pub fn any_created(&self) -> bool {
        !self.created.is_empty()
    }

    /// ## Summary
    /// Converts the created items, keeping the counters.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> BatchOutcome<U> {
        BatchOutcome {
            created: self.created.into_iter().map(f).collect(),
            requested: self.requested,
            skipped: self.skipped,
            failed: self.failed,
            message: self.message,
        }
    }
}

/// ## Summary
/// The user-facing summary of failed inserts, if any.
#[must_use]
pub fn failure_message(failed: u32) -> Option<String> {
    (failed > 0).then(|| format!("{failed} {BATCH_FAILURE_SUFFIX}"))
}

/// ## Summary
/// Runs `insert` for every item concurrently and collects the results.
///
/// Returns the successful values in item order and the number of failures.
/// Each insert runs in its own span; failures are logged and not retried.
pub async fn fan_out<'a, I, T, E, F, Fut>(items: &'a [I], insert: F) -> (Vec<T>, u32)
where
    F: Fn(&'a I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let pending = items.iter().enumerate().map(|(index, item)| {
        insert(item).instrument(tracing::debug_span!("batch_insert", index))
    });

    let mut created = Vec::with_capacity(items.len());
    let mut failed = 0_u32;
    for (index, result) in join_all(pending).await.into_iter().enumerate() {
        match result {
            Ok(value) => created.push(value),
            Err(err) => {
                tracing::warn!(index, error = %err, "Batch insert failed");
                failed += 1;
            }
        }
    }

    (created, failed)
}
