//! Consultation queue for one care site/shift.
//!
//! Ordering: urgency descending, then arrival ascending (FIFO), then insertion
//! order. Mutations run under the exclusive write lock; snapshots and stats take
//! the shared read lock, so every read observes a prefix of the mutation history.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::config::QueueConfig;
use crate::models::{EntryId, EntryState, PatientId, StaffId, TriageCategory, UrgencyLevel};
use crate::triage::TriageResult;

use super::events::EventBus;
use super::types::{EnqueueOutcome, QueueEntry, QueueError, QueueEvent, QueueEventKind, QueueStats};

/// Single-writer, multi-reader consultation queue.
#[derive(Debug)]
pub struct QueueScheduler {
    /// Care site/shift label, for logs.
    site: String,
    state: RwLock<QueueState>,
    events: EventBus,
}

#[derive(Debug, Default)]
struct QueueState {
    /// Waiting and in-consultation entries.
    active: HashMap<EntryId, QueueEntry>,
    /// Ids of `active`, kept in queue order.
    order: Vec<EntryId>,
    /// At most one active entry per patient.
    by_patient: HashMap<PatientId, EntryId>,
    /// Completed and abandoned entries, in the order they closed.
    history: Vec<QueueEntry>,
    next_sequence: u64,
}

fn queue_order(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    b.urgency
        .cmp(&a.urgency)
        .then_with(|| a.enqueued_at.cmp(&b.enqueued_at))
        .then_with(|| a.sequence.cmp(&b.sequence))
}

impl QueueScheduler {
    pub fn new(site: impl Into<String>, config: &QueueConfig) -> Self {
        Self {
            site: site.into(),
            state: RwLock::new(QueueState::default()),
            events: EventBus::new(config.event_capacity),
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    /// Observe state changes. Events are published in mutation order.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    // ── Enqueue / check-in ──────────────────────────────────

    /// Queue a classified patient, arriving now.
    pub fn enqueue(&self, patient: PatientId, result: &TriageResult) -> Result<QueueEntry, QueueError> {
        self.enqueue_at(patient, result, Utc::now())
    }

    pub fn enqueue_at(
        &self,
        patient: PatientId,
        result: &TriageResult,
        at: DateTime<Utc>,
    ) -> Result<QueueEntry, QueueError> {
        self.enqueue_or_supersede(patient, result, at)
            .map(|outcome| outcome.entry)
    }

    /// Create a `Waiting` entry, or supersede the patient's active entry.
    ///
    /// A supersede keeps the existing entry (state and arrival time) and raises its
    /// urgency to the new result's level when higher. It never lowers urgency.
    pub fn enqueue_or_supersede(
        &self,
        patient: PatientId,
        result: &TriageResult,
        at: DateTime<Utc>,
    ) -> Result<EnqueueOutcome, QueueError> {
        let mut state = self.write()?;

        if let Some(id) = state.by_patient.get(&patient).copied() {
            self.apply_triage(&mut state, id, result, "supersede")?;
            let entry = state.cloned(id)?;
            tracing::info!(site = %self.site, entry_id = %id, urgency = %entry.urgency, "Active entry superseded");
            self.events.publish(QueueEvent::for_entry(&entry, QueueEventKind::Superseded));
            return Ok(EnqueueOutcome {
                entry,
                superseded: true,
            });
        }

        let entry = state.push_new(patient, result.urgency, at, Some(result.category), None);
        self.log_enqueued(&entry);
        self.events.publish(QueueEvent::for_entry(&entry, QueueEventKind::Enqueued));
        Ok(EnqueueOutcome {
            entry,
            superseded: false,
        })
    }

    /// Manual check-in (no symptom report yet), arriving now.
    pub fn check_in(
        &self,
        patient: PatientId,
        assisted_by: Option<StaffId>,
    ) -> Result<EnqueueOutcome, QueueError> {
        self.check_in_at(patient, assisted_by, Utc::now())
    }

    /// New entries start at `Low`. An already-active patient keeps their entry;
    /// the assisting worker is recorded on it if none was yet.
    pub fn check_in_at(
        &self,
        patient: PatientId,
        assisted_by: Option<StaffId>,
        at: DateTime<Utc>,
    ) -> Result<EnqueueOutcome, QueueError> {
        let mut state = self.write()?;

        if let Some(id) = state.by_patient.get(&patient).copied() {
            if let Some(worker) = assisted_by {
                if state.assign_assistant(id, worker)? {
                    let entry = state.cloned(id)?;
                    self.events.publish(QueueEvent::for_entry(&entry, QueueEventKind::Assisted));
                }
            }
            return Ok(EnqueueOutcome {
                entry: state.cloned(id)?,
                superseded: true,
            });
        }

        let entry = state.push_new(patient, UrgencyLevel::Low, at, None, assisted_by);
        self.log_enqueued(&entry);
        self.events.publish(QueueEvent::for_entry(&entry, QueueEventKind::Enqueued));
        Ok(EnqueueOutcome {
            entry,
            superseded: false,
        })
    }

    fn log_enqueued(&self, entry: &QueueEntry) {
        if entry.urgency == UrgencyLevel::High {
            tracing::warn!(site = %self.site, entry_id = %entry.id, "High-urgency patient enqueued");
        } else {
            tracing::info!(site = %self.site, entry_id = %entry.id, urgency = %entry.urgency, "Patient enqueued");
        }
    }

    // ── Urgency ─────────────────────────────────────────────

    /// Apply a fresh triage result to an active entry: urgency is raised if the
    /// result is higher, and `last_triage` follows whenever the result is not lower.
    pub fn reclassify(&self, id: EntryId, result: &TriageResult) -> Result<QueueEntry, QueueError> {
        let mut state = self.write()?;
        if self.apply_triage(&mut state, id, result, "reclassify")? {
            let entry = state.cloned(id)?;
            self.events.publish(QueueEvent::for_entry(&entry, QueueEventKind::UrgencyChanged));
            return Ok(entry);
        }
        state.cloned(id)
    }

    /// Returns true when urgency was raised.
    fn apply_triage(
        &self,
        state: &mut QueueState,
        id: EntryId,
        result: &TriageResult,
        action: &'static str,
    ) -> Result<bool, QueueError> {
        let current = state.active_entry(id, action)?.urgency;
        if result.urgency < current {
            tracing::debug!(
                site = %self.site,
                entry_id = %id,
                current = %current,
                reported = %result.urgency,
                "Lower-urgency triage ignored for active entry"
            );
            return Ok(false);
        }

        state.set_last_triage(id, result.category);
        if result.urgency == current {
            return Ok(false);
        }
        state.set_urgency(id, result.urgency);
        tracing::info!(site = %self.site, entry_id = %id, from = %current, to = %result.urgency, "Urgency raised");
        Ok(true)
    }

    /// Raise an entry's urgency. Lower levels are ignored; arrival time is kept.
    pub fn update_urgency(&self, id: EntryId, level: UrgencyLevel) -> Result<(), QueueError> {
        let mut state = self.write()?;
        let current = state.active_entry(id, "update urgency of")?.urgency;
        if level <= current {
            tracing::debug!(site = %self.site, entry_id = %id, current = %current, requested = %level, "Urgency not raised");
            return Ok(());
        }

        state.set_urgency(id, level);
        let entry = state.cloned(id)?;
        tracing::info!(site = %self.site, entry_id = %id, from = %current, to = %level, "Urgency raised");
        self.events.publish(QueueEvent::for_entry(&entry, QueueEventKind::UrgencyChanged));
        Ok(())
    }

    /// Clinician override; the only path that can lower urgency.
    pub fn override_urgency(
        &self,
        id: EntryId,
        level: UrgencyLevel,
        clinician: &StaffId,
    ) -> Result<(), QueueError> {
        let mut state = self.write()?;
        let current = state.active_entry(id, "override urgency of")?.urgency;
        if level == current {
            return Ok(());
        }

        state.set_urgency(id, level);
        let entry = state.cloned(id)?;
        tracing::info!(
            site = %self.site,
            entry_id = %id,
            clinician = %clinician,
            from = %current,
            to = %level,
            "Urgency overridden by clinician"
        );
        self.events.publish(QueueEvent::for_entry(&entry, QueueEventKind::UrgencyChanged));
        Ok(())
    }

    /// Record the assisting health worker. Set once; repeating the same worker is a no-op.
    pub fn assign_assistant(&self, id: EntryId, worker: StaffId) -> Result<(), QueueError> {
        let mut state = self.write()?;
        if state.assign_assistant(id, worker)? {
            let entry = state.cloned(id)?;
            self.events.publish(QueueEvent::for_entry(&entry, QueueEventKind::Assisted));
        }
        Ok(())
    }

    // ── Lifecycle ───────────────────────────────────────────

    /// `Waiting → InConsultation`.
    pub fn admit(&self, id: EntryId) -> Result<QueueEntry, QueueError> {
        let mut state = self.write()?;
        self.admit_locked(&mut state, id, None)
    }

    /// As `admit`, recording the clinician. A clinician holds one consultation at a time.
    pub fn admit_by(&self, id: EntryId, clinician: &StaffId) -> Result<QueueEntry, QueueError> {
        let mut state = self.write()?;
        self.admit_locked(&mut state, id, Some(clinician))
    }

    /// Admit the first waiting entry in queue order, if any.
    pub fn admit_next(&self, clinician: &StaffId) -> Result<Option<QueueEntry>, QueueError> {
        let mut state = self.write()?;
        let next = state
            .order
            .iter()
            .copied()
            .find(|id| state.active.get(id).is_some_and(|e| e.state == EntryState::Waiting));
        match next {
            Some(id) => self.admit_locked(&mut state, id, Some(clinician)).map(Some),
            None => Ok(None),
        }
    }

    fn admit_locked(
        &self,
        state: &mut QueueState,
        id: EntryId,
        clinician: Option<&StaffId>,
    ) -> Result<QueueEntry, QueueError> {
        match state.active.get(&id) {
            Some(entry) if entry.state == EntryState::Waiting => {}
            Some(_) => return Err(QueueError::AlreadyAdmitted(id)),
            None => {
                return Err(match state.closed(id) {
                    Some(entry) if entry.state == EntryState::Completed => QueueError::AlreadyAdmitted(id),
                    Some(entry) => QueueError::InvalidTransition {
                        id,
                        from: entry.state,
                        action: "admit",
                    },
                    None => QueueError::NotFound(id),
                })
            }
        }

        if let Some(clinician) = clinician {
            if let Some(busy) = state.consultation_of(clinician) {
                return Err(QueueError::ClinicianBusy {
                    clinician: clinician.clone(),
                    entry: busy,
                });
            }
        }

        let entry = state.active.get_mut(&id).ok_or(QueueError::NotFound(id))?;
        entry.state = EntryState::InConsultation;
        entry.admitted_at = Some(Utc::now());
        entry.admitted_by = clinician.cloned();
        let entry = entry.clone();

        tracing::info!(site = %self.site, entry_id = %id, urgency = %entry.urgency, "Patient admitted to consultation");
        self.events.publish(QueueEvent::for_entry(&entry, QueueEventKind::Admitted));
        Ok(entry)
    }

    /// `InConsultation → Completed`.
    pub fn complete(&self, id: EntryId) -> Result<(), QueueError> {
        self.close(id, EntryState::InConsultation, EntryState::Completed, "complete")
    }

    /// `Waiting → Abandoned`. Called by whatever decides a patient has left.
    pub fn abandon(&self, id: EntryId) -> Result<(), QueueError> {
        self.close(id, EntryState::Waiting, EntryState::Abandoned, "abandon")
    }

    fn close(
        &self,
        id: EntryId,
        required: EntryState,
        terminal: EntryState,
        action: &'static str,
    ) -> Result<(), QueueError> {
        let mut state = self.write()?;
        let from = state.active_entry(id, action)?.state;
        if from != required {
            return Err(QueueError::InvalidTransition { id, from, action });
        }

        let entry = state.close(id, terminal)?;
        let kind = match terminal {
            EntryState::Completed => QueueEventKind::Completed,
            _ => QueueEventKind::Abandoned,
        };
        tracing::info!(site = %self.site, entry_id = %id, state = %terminal, "Queue entry closed");
        self.events.publish(QueueEvent::for_entry(&entry, kind));
        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────

    /// Active entries (`Waiting` and `InConsultation`) in queue order.
    pub fn snapshot(&self) -> Result<Vec<QueueEntry>, QueueError> {
        let state = self.read()?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.active.get(id).cloned())
            .collect())
    }

    /// Any entry, active or closed.
    pub fn get(&self, id: EntryId) -> Result<QueueEntry, QueueError> {
        let state = self.read()?;
        state
            .active
            .get(&id)
            .or_else(|| state.closed(id))
            .cloned()
            .ok_or(QueueError::NotFound(id))
    }

    pub fn active_entry_for(&self, patient: &PatientId) -> Result<Option<QueueEntry>, QueueError> {
        let state = self.read()?;
        Ok(state
            .by_patient
            .get(patient)
            .and_then(|id| state.active.get(id))
            .cloned())
    }

    /// Closed entries of one patient, oldest first.
    pub fn history(&self, patient: &PatientId) -> Result<Vec<QueueEntry>, QueueError> {
        let state = self.read()?;
        Ok(state
            .history
            .iter()
            .filter(|e| &e.patient_id == patient)
            .cloned()
            .collect())
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Result<QueueStats, QueueError> {
        let state = self.read()?;
        let waiting: Vec<&QueueEntry> = state
            .active
            .values()
            .filter(|e| e.state == EntryState::Waiting)
            .collect();

        Ok(QueueStats {
            waiting: waiting.len(),
            in_consultation: state.active.len() - waiting.len(),
            high_urgency_waiting: waiting
                .iter()
                .filter(|e| e.urgency == UrgencyLevel::High)
                .count(),
            longest_wait_secs: waiting.iter().map(|e| e.waited(now).num_seconds()).max(),
            completed_total: state
                .history
                .iter()
                .filter(|e| e.state == EntryState::Completed)
                .count(),
            abandoned_total: state
                .history
                .iter()
                .filter(|e| e.state == EntryState::Abandoned)
                .count(),
        })
    }

    // ── Lock access ─────────────────────────────────────────

    fn read(&self) -> Result<RwLockReadGuard<'_, QueueState>, QueueError> {
        self.state.read().map_err(|_| QueueError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, QueueState>, QueueError> {
        self.state.write().map_err(|_| QueueError::LockPoisoned)
    }
}

impl QueueState {
    /// Active entry, or the error an operation on a closed/unknown id reports.
    fn active_entry(&self, id: EntryId, action: &'static str) -> Result<&QueueEntry, QueueError> {
        if let Some(entry) = self.active.get(&id) {
            return Ok(entry);
        }
        Err(match self.closed(id) {
            Some(entry) => QueueError::InvalidTransition {
                id,
                from: entry.state,
                action,
            },
            None => QueueError::NotFound(id),
        })
    }

    fn closed(&self, id: EntryId) -> Option<&QueueEntry> {
        self.history.iter().rev().find(|e| e.id == id)
    }

    fn cloned(&self, id: EntryId) -> Result<QueueEntry, QueueError> {
        self.active.get(&id).cloned().ok_or(QueueError::NotFound(id))
    }

    fn consultation_of(&self, clinician: &StaffId) -> Option<EntryId> {
        self.active
            .values()
            .find(|e| e.state == EntryState::InConsultation && e.admitted_by.as_ref() == Some(clinician))
            .map(|e| e.id)
    }

    fn position_for(&self, entry: &QueueEntry) -> usize {
        self.order.partition_point(|id| {
            self.active
                .get(id)
                .is_some_and(|other| queue_order(other, entry) == Ordering::Less)
        })
    }

    fn push_new(
        &mut self,
        patient: PatientId,
        urgency: UrgencyLevel,
        at: DateTime<Utc>,
        last_triage: Option<TriageCategory>,
        assisted_by: Option<StaffId>,
    ) -> QueueEntry {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let entry = QueueEntry {
            id: uuid::Uuid::new_v4(),
            patient_id: patient,
            urgency,
            enqueued_at: at,
            assisted_by,
            admitted_by: None,
            state: EntryState::Waiting,
            last_triage,
            admitted_at: None,
            closed_at: None,
            sequence,
        };

        let pos = self.position_for(&entry);
        self.order.insert(pos, entry.id);
        self.by_patient.insert(entry.patient_id.clone(), entry.id);
        self.active.insert(entry.id, entry.clone());
        entry
    }

    /// Change urgency and move the entry to its new position. Arrival time is untouched.
    fn set_urgency(&mut self, id: EntryId, level: UrgencyLevel) {
        let Some(entry) = self.active.get_mut(&id) else { return };
        entry.urgency = level;

        if let Some(pos) = self.order.iter().position(|x| *x == id) {
            self.order.remove(pos);
        }
        let pos = match self.active.get(&id) {
            Some(entry) => self.position_for(entry),
            None => return,
        };
        self.order.insert(pos, id);
    }

    fn set_last_triage(&mut self, id: EntryId, category: TriageCategory) {
        if let Some(entry) = self.active.get_mut(&id) {
            entry.last_triage = Some(category);
        }
    }

    /// Returns true when the worker was newly recorded.
    fn assign_assistant(&mut self, id: EntryId, worker: StaffId) -> Result<bool, QueueError> {
        let current = self.active_entry(id, "assign assistant to")?.assisted_by.clone();
        match current {
            Some(existing) if existing == worker => Ok(false),
            Some(existing) => Err(QueueError::AssistantAlreadyAssigned {
                id,
                assistant: existing,
            }),
            None => {
                if let Some(entry) = self.active.get_mut(&id) {
                    entry.assisted_by = Some(worker);
                }
                Ok(true)
            }
        }
    }

    /// Move an active entry into history in a terminal state.
    fn close(&mut self, id: EntryId, terminal: EntryState) -> Result<QueueEntry, QueueError> {
        let mut entry = self.active.remove(&id).ok_or(QueueError::NotFound(id))?;
        self.order.retain(|x| *x != id);
        self.by_patient.remove(&entry.patient_id);

        entry.state = terminal;
        entry.closed_at = Some(Utc::now());
        self.history.push(entry.clone());
        Ok(entry)
    }
}
