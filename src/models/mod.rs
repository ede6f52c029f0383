//! Domain types shared by the classifier, the queue and the intake desk.

pub mod enums;
pub mod identity;
pub mod symptom;
pub mod vital_sign;

use thiserror::Error;

pub use enums::{EntryState, RecommendedAction, TriageCategory, UrgencyLevel};
pub use identity::{EntryId, PatientId, StaffId};
pub use symptom::SymptomReport;
pub use vital_sign::{ReferenceRanges, VitalReading, VitalType, VitalUnit, VitalsSnapshot};

/// Validation failures raised while building domain values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("{0} identity must not be empty")]
    EmptyIdentity(&'static str),

    #[error("Invalid {vital} reading: {reason}")]
    InvalidVital { vital: &'static str, reason: String },

    #[error("Vitals snapshot contains no readings")]
    EmptySnapshot,

    #[error("Vitals snapshot has more than one {0} reading")]
    DuplicateVital(&'static str),
}
