//! Bilingual replies shown to the patient after classification.
//!
//! Replies are keyed by the resolved category only. Each reply carries the Hindi
//! line first, then the English line, separated by " / ".

use crate::models::TriageCategory;

/// Emergency number shown in escalation replies.
pub const EMERGENCY_NUMBER: &str = "108";

pub fn triage_message(category: TriageCategory) -> String {
    match category {
        TriageCategory::Emergency => format!(
            "⚠️ आपके लक्षण गंभीर हो सकते हैं। तुरंत डॉक्टर से मिलें। मैं आपके लिए तत्काल परामर्श बुक कर रहा हूं। \
             आपात स्थिति में {EMERGENCY_NUMBER} पर कॉल करें। / \
             Your symptoms can be serious. Please see a doctor immediately. \
             I am booking an urgent consultation for you. In an emergency, call {EMERGENCY_NUMBER}."
        ),
        TriageCategory::Moderate => "मुझे आपकी समस्या समझ आई। कृपया जल्द ही डॉक्टर से परामर्श लें, \
             आपको परामर्श कतार में जोड़ दिया गया है। / \
             I understand your concern. Please consult a doctor soon; \
             you have been added to the consultation queue."
            .into(),
        TriageCategory::AbnormalVitals => "आपके कुछ स्वास्थ्य माप सामान्य सीमा से बाहर हैं। \
             कृपया डॉक्टर से परामर्श लें, आपको परामर्श कतार में जोड़ दिया गया है। / \
             Some of your vital readings are outside the normal range. Please consult a doctor; \
             you have been added to the consultation queue."
            .into(),
        TriageCategory::General => "धन्यवाद। आराम करें और पानी पीते रहें। कृपया अपने लक्षणों के बारे में और बताएं। / \
             Thank you. Rest and drink plenty of fluids. Please tell me more about your symptoms."
            .into(),
    }
}
