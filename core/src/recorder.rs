// lustre/src/recorder.rs

//! Appends immutable status-history entries for orders and refunds.

use crate::error::LifecycleResult;
use crate::model::{HistorySubject, StatusHistoryEntry};
use crate::store::LifecycleStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct StatusHistoryRecorder {
  store: Arc<dyn LifecycleStore>,
}

impl StatusHistoryRecorder {
  pub fn new(store: Arc<dyn LifecycleStore>) -> Self {
    Self { store }
  }

  #[instrument(
    name = "history::record",
    skip(self, note),
    fields(%subject, %subject_id, %previous_status, %new_status),
    err(Display)
  )]
  pub async fn record(
    &self,
    subject: HistorySubject,
    subject_id: Uuid,
    previous_status: &str,
    new_status: &str,
    note: Option<String>,
    actor_id: Option<Uuid>,
  ) -> LifecycleResult<StatusHistoryEntry> {
    let entry = StatusHistoryEntry {
      id: Uuid::new_v4(),
      subject,
      subject_id,
      previous_status: previous_status.to_string(),
      new_status: new_status.to_string(),
      note,
      actor_id,
      created_at: Utc::now(),
    };
    self.store.append_history(&entry).await?;
    debug!(entry_id = %entry.id, "History entry appended.");
    Ok(entry)
  }

  /// Entries for one order or refund, oldest first.
  pub async fn entries(&self, subject: HistorySubject, subject_id: Uuid) -> LifecycleResult<Vec<StatusHistoryEntry>> {
    Ok(self.store.history(subject, subject_id).await?)
  }
}
