//! Intake desk: the front door of a care site.
//!
//! Symptom reports are classified against the patient's logged vitals and then
//! queued; vitals recorded later can raise an active entry's urgency.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use thiserror::Error;

use crate::config::TriageConfig;
use crate::models::{
    PatientId, ReferenceRanges, StaffId, SymptomReport, TriageCategory, UrgencyLevel, VitalReading,
    VitalType, VitalsSnapshot,
};
use crate::queue::{EnqueueOutcome, QueueEntry, QueueError, QueueScheduler};
use crate::triage::{parse_reading, Classifier, KeywordClassifier, TriageError, TriageResult};

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error(transparent)]
    Triage(#[from] TriageError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Internal lock error")]
    LockPoisoned,
}

/// What the patient is told and where they now stand in the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeOutcome {
    pub triage: TriageResult,
    pub entry: QueueEntry,
    /// True when the report updated an entry that was already active.
    pub superseded: bool,
}

pub struct IntakeDesk<C: Classifier = KeywordClassifier> {
    classifier: C,
    scheduler: Arc<QueueScheduler>,
    ranges: ReferenceRanges,
    /// Append-only per patient, in recording order.
    vitals: RwLock<HashMap<PatientId, Vec<VitalsSnapshot>>>,
}

impl IntakeDesk<KeywordClassifier> {
    pub fn new(scheduler: Arc<QueueScheduler>, ranges: ReferenceRanges) -> Self {
        Self::with_classifier(KeywordClassifier::new(), scheduler, ranges)
    }

    /// Desk with its own queue for `site`, built from loaded configuration.
    pub fn from_config(site: impl Into<String>, config: &TriageConfig) -> Self {
        let scheduler = Arc::new(QueueScheduler::new(site, &config.queue));
        Self::new(scheduler, config.ranges.clone())
    }
}

impl<C: Classifier> IntakeDesk<C> {
    pub fn with_classifier(classifier: C, scheduler: Arc<QueueScheduler>, ranges: ReferenceRanges) -> Self {
        Self {
            classifier,
            scheduler,
            ranges,
            vitals: RwLock::new(HashMap::new()),
        }
    }

    pub fn scheduler(&self) -> &Arc<QueueScheduler> {
        &self.scheduler
    }

    pub fn ranges(&self) -> &ReferenceRanges {
        &self.ranges
    }

    /// Classify a report and queue the patient.
    ///
    /// Rejected input is neither logged nor queued. The report's own vitals are
    /// appended to the log after classification. The vitals log stays locked until
    /// the patient is queued, so a reading recorded meanwhile is applied to the entry.
    pub fn submit_report(
        &self,
        patient: PatientId,
        report: SymptomReport,
    ) -> Result<IntakeOutcome, IntakeError> {
        let reassessed = report.vitals().map(|v| v.reassessed(&self.ranges));
        let report = match reassessed {
            Some(vitals) => report.with_vitals(vitals),
            None => report,
        };

        let mut log = self.vitals.write().map_err(|_| IntakeError::LockPoisoned)?;
        let history = log.get(&patient).map(Vec::as_slice).unwrap_or_default();
        let triage = self.classifier.classify(&report, history)?;

        if let Some(snapshot) = report.vitals() {
            log.entry(patient.clone()).or_default().push(snapshot.clone());
        }

        let EnqueueOutcome { entry, superseded } =
            self.scheduler
                .enqueue_or_supersede(patient, &triage, report.reported_at())?;
        drop(log);

        Ok(IntakeOutcome {
            triage,
            entry,
            superseded,
        })
    }

    /// Log a vitals snapshot, flagged against this desk's ranges. An abnormal
    /// snapshot raises the patient's active entry to at least `Medium`; returns
    /// that entry as it now stands.
    pub fn record_vitals(
        &self,
        patient: &PatientId,
        snapshot: VitalsSnapshot,
    ) -> Result<Option<QueueEntry>, IntakeError> {
        let snapshot = snapshot.reassessed(&self.ranges);
        let abnormal = snapshot.has_abnormal();

        let mut log = self.vitals.write().map_err(|_| IntakeError::LockPoisoned)?;
        log.entry(patient.clone()).or_default().push(snapshot);

        let Some(entry) = self.scheduler.active_entry_for(patient)? else {
            return Ok(None);
        };
        if !abnormal || entry.urgency >= UrgencyLevel::Medium {
            return Ok(Some(entry));
        }

        tracing::info!(entry_id = %entry.id, "Abnormal vitals recorded for queued patient");
        let raised = TriageResult::from_category(TriageCategory::AbnormalVitals, None);
        match self.scheduler.reclassify(entry.id, &raised) {
            Ok(entry) => Ok(Some(entry)),
            // Closed by a clinician since the lookup
            Err(QueueError::InvalidTransition { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Manual check-in at the desk, before any symptom report.
    pub fn check_in(
        &self,
        patient: PatientId,
        worker: Option<StaffId>,
    ) -> Result<EnqueueOutcome, IntakeError> {
        Ok(self.scheduler.check_in(patient, worker)?)
    }

    /// Parse a dashboard-style string ("101.5°F", "140/90") with this desk's ranges.
    pub fn parse_reading(&self, vital: VitalType, raw: &str) -> Result<VitalReading, IntakeError> {
        Ok(parse_reading(vital, raw, &self.ranges)?)
    }

    /// Snapshots in recording order.
    pub fn vitals_history(&self, patient: &PatientId) -> Result<Vec<VitalsSnapshot>, IntakeError> {
        let log = self.vitals.read().map_err(|_| IntakeError::LockPoisoned)?;
        Ok(log.get(patient).cloned().unwrap_or_default())
    }

    /// Most recent snapshot by measurement time.
    pub fn latest_vitals(&self, patient: &PatientId) -> Result<Option<VitalsSnapshot>, IntakeError> {
        let log = self.vitals.read().map_err(|_| IntakeError::LockPoisoned)?;
        Ok(log
            .get(patient)
            .and_then(|snapshots| crate::triage::latest_snapshot(None, snapshots))
            .cloned())
    }
}
