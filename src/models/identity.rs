use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ModelError;

/// Queue entries are keyed by a random v4 UUID assigned at creation.
pub type EntryId = Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Trims surrounding whitespace; blank identities are rejected.
            pub fn new(raw: impl Into<String>) -> Result<Self, ModelError> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::EmptyIdentity($label));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identity of a patient as known to the external registry.
    PatientId,
    "Patient"
);

string_id!(
    /// Identity of a health worker or clinician.
    StaffId,
    "Staff"
);
