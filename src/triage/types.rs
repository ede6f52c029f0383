use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    ModelError, RecommendedAction, SymptomReport, TriageCategory, UrgencyLevel, VitalsSnapshot,
};

/// Outcome of classifying one symptom report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResult {
    pub urgency: UrgencyLevel,
    pub action: RecommendedAction,
    /// Which rule resolved the result.
    pub category: TriageCategory,
    /// Bilingual reply, templated by category. Never echoes the patient's text.
    pub message: String,
    /// True only for `EscalateUrgent`.
    pub requires_immediate_escalation: bool,
    /// Table phrase that matched, for the audit trail.
    pub matched_keyword: Option<String>,
}

impl TriageResult {
    /// Build the result a category resolves to.
    pub fn from_category(category: TriageCategory, matched_keyword: Option<String>) -> Self {
        let action = category.action();
        Self {
            urgency: category.urgency(),
            action,
            category,
            message: super::messages::triage_message(category),
            requires_immediate_escalation: action == RecommendedAction::EscalateUrgent,
            matched_keyword,
        }
    }
}

/// Result of symptom text sanitization.
#[derive(Debug, Clone)]
pub struct SanitizedText {
    /// The cleaned text.
    pub text: String,
    /// Whether any modifications were made.
    pub was_modified: bool,
}

/// Triage errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<ModelError> for TriageError {
    fn from(err: ModelError) -> Self {
        TriageError::InvalidInput(err.to_string())
    }
}

/// A symptom classifier. Implementations must keep the category priority
/// `Emergency > Moderate > AbnormalVitals > General` and be deterministic.
pub trait Classifier {
    fn classify(
        &self,
        report: &SymptomReport,
        history: &[VitalsSnapshot],
    ) -> Result<TriageResult, TriageError>;
}
