use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::sanitize::normalize_for_matching;

/// Language a keyword table is written in. Both tables of a category are always checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Hindi,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }
}

/// A table phrase found in the normalized symptom text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordMatch {
    pub phrase: &'static str,
    pub language: Language,
}

// ── Keyword sets ────────────────────────────────────────────

static EMERGENCY_EN: &[&str] = &[
    "chest pain", "chest tightness", "heart attack",
    "can't breathe", "cant breathe", "cannot breathe", "unable to breathe",
    "difficulty breathing", "trouble breathing", "shortness of breath",
    "breathing problem", "not breathing",
    "unconscious", "unresponsive", "fainted", "passed out",
    "seizure", "convulsion", "stroke", "face drooping", "slurred speech",
    "severe bleeding", "heavy bleeding", "coughing blood", "vomiting blood",
    "accident", "suicidal",
];

static EMERGENCY_HI: &[&str] = &[
    "सीने में दर्द", "छाती में दर्द", "दिल का दौरा",
    "सांस लेने में तकलीफ", "साँस लेने में तकलीफ", "सांस नहीं", "साँस नहीं",
    "बेहोश", "दौरा पड़", "लकवा",
    "बहुत खून", "खून बह", "खून की उल्टी",
    "दुर्घटना",
];

static MODERATE_EN: &[&str] = &[
    "fever", "high temperature", "chills",
    "persistent pain", "constant pain", "severe headache", "migraine",
    "vomiting", "diarrhea", "diarrhoea", "dehydration",
    "dizziness", "dizzy",
    "high sugar", "high glucose",
    "infection", "persistent cough", "burning urination",
];

static MODERATE_HI: &[&str] = &[
    "बुखार", "तेज़ सिरदर्द", "लगातार दर्द",
    "उल्टी", "दस्त", "चक्कर",
    "शुगर बढ़", "संक्रमण", "लगातार खांसी",
];

// ── Compiled tables ─────────────────────────────────────────

/// A keyword table with its phrases pre-normalized for matching.
struct KeywordTable {
    language: Language,
    phrases: Vec<(&'static str, String)>,
}

impl KeywordTable {
    fn compile(language: Language, phrases: &'static [&'static str]) -> Self {
        Self {
            language,
            phrases: phrases
                .iter()
                .map(|p| (*p, normalize_for_matching(p)))
                .collect(),
        }
    }

    fn find(&self, normalized_text: &str) -> Option<KeywordMatch> {
        self.phrases
            .iter()
            .find(|(_, normalized)| normalized_text.contains(normalized.as_str()))
            .map(|(phrase, _)| KeywordMatch {
                phrase: *phrase,
                language: self.language,
            })
    }
}

static EMERGENCY_TABLES: LazyLock<[KeywordTable; 2]> = LazyLock::new(|| {
    [
        KeywordTable::compile(Language::English, EMERGENCY_EN),
        KeywordTable::compile(Language::Hindi, EMERGENCY_HI),
    ]
});

static MODERATE_TABLES: LazyLock<[KeywordTable; 2]> = LazyLock::new(|| {
    [
        KeywordTable::compile(Language::English, MODERATE_EN),
        KeywordTable::compile(Language::Hindi, MODERATE_HI),
    ]
});

fn find_in(tables: &[KeywordTable], normalized_text: &str) -> Option<KeywordMatch> {
    tables.iter().find_map(|table| table.find(normalized_text))
}

/// First emergency phrase (English table, then Hindi) found in normalized text.
pub fn match_emergency(normalized_text: &str) -> Option<KeywordMatch> {
    find_in(&*EMERGENCY_TABLES, normalized_text)
}

/// First moderate phrase (English table, then Hindi) found in normalized text.
pub fn match_moderate(normalized_text: &str) -> Option<KeywordMatch> {
    find_in(&*MODERATE_TABLES, normalized_text)
}
