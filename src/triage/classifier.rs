use crate::models::{SymptomReport, TriageCategory, VitalsSnapshot};

use super::keywords::{match_emergency, match_moderate};
use super::sanitize::{normalize_for_matching, sanitize_symptom_text};
use super::types::{Classifier, TriageError, TriageResult};

/// Deterministic keyword classifier over the bilingual tables.
///
/// The whole report is scanned, however long.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for KeywordClassifier {
    fn classify(
        &self,
        report: &SymptomReport,
        history: &[VitalsSnapshot],
    ) -> Result<TriageResult, TriageError> {
        let sanitized = sanitize_symptom_text(report.text())?;
        let normalized = normalize_for_matching(&sanitized.text);

        // Emergency: short-circuits every other signal
        if let Some(hit) = match_emergency(&normalized) {
            tracing::warn!(
                keyword = hit.phrase,
                language = hit.language.code(),
                "Emergency indicator matched, escalating"
            );
            return Ok(TriageResult::from_category(
                TriageCategory::Emergency,
                Some(hit.phrase.to_string()),
            ));
        }

        if let Some(hit) = match_moderate(&normalized) {
            tracing::debug!(keyword = hit.phrase, language = hit.language.code(), "Moderate indicator matched");
            return Ok(TriageResult::from_category(
                TriageCategory::Moderate,
                Some(hit.phrase.to_string()),
            ));
        }

        if latest_snapshot(report.vitals(), history).is_some_and(VitalsSnapshot::has_abnormal) {
            tracing::debug!("Abnormal vitals raised urgency");
            return Ok(TriageResult::from_category(TriageCategory::AbnormalVitals, None));
        }

        Ok(TriageResult::from_category(TriageCategory::General, None))
    }
}

/// Classify with the default keyword classifier.
pub fn classify(
    report: &SymptomReport,
    history: &[VitalsSnapshot],
) -> Result<TriageResult, TriageError> {
    KeywordClassifier::new().classify(report, history)
}

/// Most recent snapshot by `taken_at`. On equal timestamps the later one wins,
/// and the report's own vitals count as later than any history entry.
pub fn latest_snapshot<'a>(
    attached: Option<&'a VitalsSnapshot>,
    history: &'a [VitalsSnapshot],
) -> Option<&'a VitalsSnapshot> {
    history
        .iter()
        .chain(attached)
        .fold(None, |latest: Option<&VitalsSnapshot>, candidate| match latest {
            Some(current) if current.taken_at() > candidate.taken_at() => Some(current),
            _ => Some(candidate),
        })
}
