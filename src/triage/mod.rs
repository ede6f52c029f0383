//! Symptom triage: free text and vitals in, urgency and next action out.
//!
//! Categories are evaluated in a fixed priority order:
//! emergency phrases > moderate phrases > abnormal latest vitals > general.
//! Each category has an English and a Hindi table; a hit in either counts.

pub mod classifier;
pub mod keywords;
pub mod messages;
pub mod sanitize;
pub mod types;
pub mod vitals_parse;

pub use classifier::{classify, latest_snapshot, KeywordClassifier};
pub use keywords::{KeywordMatch, Language};
pub use types::{Classifier, TriageError, TriageResult};
pub use vitals_parse::parse_reading;
