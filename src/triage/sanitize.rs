use super::types::{SanitizedText, TriageError};

/// Clean raw symptom text before classification.
///
/// Strips invisible Unicode and control characters and collapses whitespace.
/// Nothing is cut: every phrase in the input stays visible to the keyword tables.
/// Text that is empty afterwards is rejected.
pub fn sanitize_symptom_text(raw: &str) -> Result<SanitizedText, TriageError> {
    let visible = remove_control_characters(&remove_invisible_unicode(raw));
    let text = collapse_whitespace(&visible);

    if text.is_empty() {
        return Err(TriageError::InvalidInput(
            "symptom text is empty".to_string(),
        ));
    }

    let was_modified = text != raw;
    Ok(SanitizedText { text, was_modified })
}

/// Fold sanitized text into the form keyword tables are matched against.
///
/// Lower-cases (Unicode-aware), folds typographic apostrophes to `'` and splits
/// precomposed Devanagari nukta letters so either encoding matches.
pub fn normalize_for_matching(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        match c {
            '\u{2019}' | '\u{2018}' | '\u{02BC}' | '`' => out.push('\''),
            _ => match decompose_nukta(c) {
                Some(base) => {
                    out.push(base);
                    out.push('\u{093C}');
                }
                None => out.push(c),
            },
        }
    }
    out
}

/// Base consonant of a precomposed Devanagari nukta letter.
fn decompose_nukta(c: char) -> Option<char> {
    match c {
        '\u{0929}' => Some('\u{0928}'),
        '\u{0931}' => Some('\u{0930}'),
        '\u{0934}' => Some('\u{0933}'),
        '\u{0958}' => Some('\u{0915}'),
        '\u{0959}' => Some('\u{0916}'),
        '\u{095A}' => Some('\u{0917}'),
        '\u{095B}' => Some('\u{091C}'),
        '\u{095C}' => Some('\u{0921}'),
        '\u{095D}' => Some('\u{0922}'),
        '\u{095E}' => Some('\u{092B}'),
        '\u{095F}' => Some('\u{092F}'),
        _ => None,
    }
}

/// Remove zero-width and invisible Unicode characters.
///
/// ZWJ/ZWNJ (U+200C/U+200D) are dropped too: they only alter glyph shaping in
/// Devanagari and would otherwise split a keyword.
fn remove_invisible_unicode(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}'  // Zero-width chars
                | '\u{202A}'..='\u{202E}' // Directional formatting
                | '\u{2060}'..='\u{2064}' // Invisible operators
                | '\u{2066}'..='\u{2069}' // Directional isolates
                | '\u{FEFF}'              // BOM
                | '\u{00AD}'              // Soft hyphen
                | '\u{034F}'              // Combining grapheme joiner
            )
        })
        .collect()
}

/// Control characters become spaces so words on either side stay apart.
fn remove_control_characters(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_rejected() {
        for raw in ["", "   ", "\n\t ", "\u{200B}\u{FEFF}", "\u{0007}"] {
            assert!(
                matches!(sanitize_symptom_text(raw), Err(TriageError::InvalidInput(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn clean_text_untouched() {
        let out = sanitize_symptom_text("mild cough").unwrap();
        assert_eq!(out.text, "mild cough");
        assert!(!out.was_modified);
    }

    #[test]
    fn invisible_characters_stripped() {
        let out = sanitize_symptom_text("chest\u{200B} pain").unwrap();
        assert_eq!(out.text, "chest pain");
        assert!(out.was_modified);
    }

    #[test]
    fn whitespace_collapsed_and_controls_split_words() {
        let out = sanitize_symptom_text("  fever\n\nand\tchills  ").unwrap();
        assert_eq!(out.text, "fever and chills");
    }

    #[test]
    fn long_text_kept_whole() {
        let raw = format!("{} सीने में दर्द", "बुखार ".repeat(1_000));
        let out = sanitize_symptom_text(&raw).unwrap();
        assert!(out.text.ends_with("सीने में दर्द"));
        assert_eq!(out.text.chars().count(), raw.trim_end().chars().count() - 1);
    }

    #[test]
    fn normalization_lowercases_and_folds_apostrophes() {
        assert_eq!(normalize_for_matching("Can\u{2019}t BREATHE"), "can't breathe");
    }

    #[test]
    fn normalization_decomposes_nukta() {
        let precomposed = "दौरा प\u{095C}ा";
        let decomposed = "दौरा प\u{0921}\u{093C}ा";
        assert_eq!(normalize_for_matching(precomposed), normalize_for_matching(decomposed));
    }

    #[test]
    fn mixed_script_does_not_panic() {
        let text = "मुझे सिरदर्द है / I have headache 🤒 ਬੁਖਾਰ";
        let out = sanitize_symptom_text(text).unwrap();
        assert_eq!(out.text, text);
        let _ = normalize_for_matching(&out.text);
    }
}
