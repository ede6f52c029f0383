use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vital_sign::VitalsSnapshot;

/// Free-text symptom report as submitted by a patient or health worker.
///
/// The text may mix scripts (e.g. Hindi and English in one message). The report
/// has no identity of its own; callers always pair it with a `PatientId`.
/// Attached vitals are validated while deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomReport {
    text: String,
    vitals: Option<VitalsSnapshot>,
    reported_at: DateTime<Utc>,
}

impl SymptomReport {
    pub fn new(text: impl Into<String>, reported_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            vitals: None,
            reported_at,
        }
    }

    /// Attach vitals measured alongside the report.
    pub fn with_vitals(mut self, vitals: VitalsSnapshot) -> Self {
        self.vitals = Some(vitals);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn vitals(&self) -> Option<&VitalsSnapshot> {
        self.vitals.as_ref()
    }

    pub fn reported_at(&self) -> DateTime<Utc> {
        self.reported_at
    }
}
