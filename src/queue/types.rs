use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EntryId, EntryState, PatientId, StaffId, TriageCategory, UrgencyLevel};

/// A patient's position in the consultation queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub patient_id: PatientId,
    pub urgency: UrgencyLevel,
    /// Arrival time. Never changes, including across urgency changes.
    pub enqueued_at: DateTime<Utc>,
    /// Health worker who assisted the check-in. Set once, never cleared.
    pub assisted_by: Option<StaffId>,
    /// Clinician who admitted the entry, when admitted through `admit_by`.
    pub admitted_by: Option<StaffId>,
    pub state: EntryState,
    /// Category of the most recent triage that set the urgency.
    pub last_triage: Option<TriageCategory>,
    pub admitted_at: Option<DateTime<Utc>>,
    /// When the entry reached `Completed` or `Abandoned`.
    pub closed_at: Option<DateTime<Utc>>,
    /// Insertion counter; breaks ties between identical arrival times.
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl QueueEntry {
    /// Time spent in the queue so far, clamped at zero.
    pub fn waited(&self, now: DateTime<Utc>) -> Duration {
        let end = self.admitted_at.or(self.closed_at).unwrap_or(now);
        (end - self.enqueued_at).max(Duration::zero())
    }
}

/// What happened to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueEventKind {
    Enqueued,
    /// A new report arrived for a patient who already had an active entry.
    Superseded,
    UrgencyChanged,
    Assisted,
    Admitted,
    Completed,
    Abandoned,
}

/// State-change notification published to queue subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEvent {
    pub entry_id: EntryId,
    pub patient_id: PatientId,
    pub kind: QueueEventKind,
    pub state: EntryState,
    pub urgency: UrgencyLevel,
    pub at: DateTime<Utc>,
}

impl QueueEvent {
    pub(crate) fn for_entry(entry: &QueueEntry, kind: QueueEventKind) -> Self {
        Self {
            entry_id: entry.id,
            patient_id: entry.patient_id.clone(),
            kind,
            state: entry.state,
            urgency: entry.urgency,
            at: Utc::now(),
        }
    }
}

/// Result of `enqueue_or_supersede`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOutcome {
    pub entry: QueueEntry,
    /// True when the patient already had an active entry and no new one was created.
    pub superseded: bool,
}

/// Dashboard counters, all taken from one consistent view of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub waiting: usize,
    pub in_consultation: usize,
    pub high_urgency_waiting: usize,
    /// Longest current wait among `Waiting` entries, in seconds.
    pub longest_wait_secs: Option<i64>,
    pub completed_total: usize,
    pub abandoned_total: usize,
}

/// Queue errors. Every rejected operation leaves the queue unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue entry not found: {0}")]
    NotFound(EntryId),

    #[error("Queue entry {0} has already been admitted")]
    AlreadyAdmitted(EntryId),

    #[error("Cannot {action} queue entry {id} while it is {from}")]
    InvalidTransition {
        id: EntryId,
        from: EntryState,
        action: &'static str,
    },

    #[error("Clinician {clinician} is already in consultation (entry {entry})")]
    ClinicianBusy { clinician: StaffId, entry: EntryId },

    #[error("Queue entry {id} is already assisted by {assistant}")]
    AssistantAlreadyAssigned { id: EntryId, assistant: StaffId },

    #[error("Internal lock error")]
    LockPoisoned,
}
