//! Parse vitals from the display strings dashboards and health-worker forms use,
//! e.g. `"101.5°F"`, `"140/90"`, `"95 BPM"`, `"180 mg/dL"`.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ReferenceRanges, VitalReading, VitalType, VitalUnit};

use super::types::TriageError;

static TEMPERATURE: LazyLock<Regex> = LazyLock::new(|| {
    // Degree sign may arrive as °, º, "deg" or mangled bytes; only the unit letter matters.
    Regex::new(r"(?i)^\s*(\d{2,3}(?:\.\d+)?)\s*(?:deg|[^\w\s])*\s*([fc])?\s*$")
        .expect("Invalid temperature regex")
});

static BLOOD_PRESSURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{2,3})\s*/\s*(\d{2,3})\s*(?:mm\s*hg)?\s*$")
        .expect("Invalid blood pressure regex")
});

static HEART_RATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{2,3})\s*(?:bpm|/\s*min)?\s*$").expect("Invalid heart rate regex")
});

static GLUCOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,3}(?:\.\d+)?)\s*(mg\s*/\s*dl|mmol\s*/\s*l)?\s*$")
        .expect("Invalid glucose regex")
});

/// Parse one display string into a reading of `vital`.
///
/// Temperatures without a unit letter are taken as Fahrenheit; glucose without a
/// unit as mg/dL.
pub fn parse_reading(
    vital: VitalType,
    raw: &str,
    ranges: &ReferenceRanges,
) -> Result<VitalReading, TriageError> {
    let unparsable = || TriageError::InvalidInput(format!("cannot parse {} from {raw:?}", vital.as_str()));

    let (primary, secondary, unit) = match vital {
        VitalType::Temperature => {
            let caps = TEMPERATURE.captures(raw).ok_or_else(unparsable)?;
            let unit = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
                Some(letter) if letter == "c" => VitalUnit::Celsius,
                _ => VitalUnit::Fahrenheit,
            };
            (number(&caps[1]).ok_or_else(unparsable)?, None, unit)
        }
        VitalType::BloodPressure => {
            let caps = BLOOD_PRESSURE.captures(raw).ok_or_else(unparsable)?;
            (
                number(&caps[1]).ok_or_else(unparsable)?,
                Some(number(&caps[2]).ok_or_else(unparsable)?),
                VitalUnit::MmHg,
            )
        }
        VitalType::HeartRate => {
            let caps = HEART_RATE.captures(raw).ok_or_else(unparsable)?;
            (number(&caps[1]).ok_or_else(unparsable)?, None, VitalUnit::Bpm)
        }
        VitalType::BloodGlucose => {
            let caps = GLUCOSE.captures(raw).ok_or_else(unparsable)?;
            let unit = match caps.get(2) {
                Some(m) if m.as_str().to_ascii_lowercase().starts_with("mmol") => VitalUnit::MmolPerL,
                _ => VitalUnit::MgPerDl,
            };
            (number(&caps[1]).ok_or_else(unparsable)?, None, unit)
        }
    };

    Ok(VitalReading::new(vital, primary, secondary, unit, ranges)?)
}

fn number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(vital: VitalType, raw: &str) -> Result<VitalReading, TriageError> {
        parse_reading(vital, raw, &ReferenceRanges::default())
    }

    #[test]
    fn temperature_formats() {
        let r = parse(VitalType::Temperature, "101.5°F").unwrap();
        assert_eq!(r.value_primary(), 101.5);
        assert_eq!(r.unit(), VitalUnit::Fahrenheit);
        assert!(!r.is_normal());

        let bare = parse(VitalType::Temperature, "98.6").unwrap();
        assert_eq!(bare.unit(), VitalUnit::Fahrenheit);
        assert!(bare.is_normal());

        let celsius = parse(VitalType::Temperature, "38.2 °C").unwrap();
        assert_eq!(celsius.unit(), VitalUnit::Celsius);
        assert!(!celsius.is_normal());
    }

    #[test]
    fn temperature_with_mangled_degree_sign() {
        let r = parse(VitalType::Temperature, "99.2¬∞F").unwrap();
        assert_eq!(r.value_primary(), 99.2);
        assert!(r.is_normal());
    }

    #[test]
    fn blood_pressure_formats() {
        let r = parse(VitalType::BloodPressure, "140/90").unwrap();
        assert_eq!(r.value_primary(), 140.0);
        assert_eq!(r.value_secondary(), Some(90.0));
        assert!(r.is_normal());

        let high = parse(VitalType::BloodPressure, "150 / 95 mmHg").unwrap();
        assert!(!high.is_normal());
    }

    #[test]
    fn heart_rate_formats() {
        assert!(parse(VitalType::HeartRate, "95 BPM").unwrap().is_normal());
        assert!(parse(VitalType::HeartRate, "72").unwrap().is_normal());
        assert!(!parse(VitalType::HeartRate, "130 bpm").unwrap().is_normal());
    }

    #[test]
    fn glucose_formats() {
        let r = parse(VitalType::BloodGlucose, "180 mg/dL").unwrap();
        assert_eq!(r.unit(), VitalUnit::MgPerDl);
        assert!(!r.is_normal());

        let mmol = parse(VitalType::BloodGlucose, "5.5 mmol/L").unwrap();
        assert_eq!(mmol.unit(), VitalUnit::MmolPerL);
        assert!(mmol.is_normal());
    }

    #[test]
    fn garbage_is_invalid_input() {
        for (vital, raw) in [
            (VitalType::Temperature, "hot"),
            (VitalType::BloodPressure, "140"),
            (VitalType::HeartRate, "fast"),
            (VitalType::BloodGlucose, ""),
        ] {
            assert!(
                matches!(parse(vital, raw), Err(TriageError::InvalidInput(_))),
                "accepted {raw:?} as {}",
                vital.as_str()
            );
        }
    }

    #[test]
    fn zero_value_rejected_by_model() {
        let err = parse(VitalType::HeartRate, "00").unwrap_err();
        assert!(matches!(err, TriageError::InvalidInput(msg) if msg.contains("heart_rate")));
    }
}
