use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModelError;

/// Type of vital sign measurement recorded at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalType {
    Temperature,
    BloodPressure,
    HeartRate,
    BloodGlucose,
}

impl VitalType {
    pub fn as_str(self) -> &'static str {
        match self {
            VitalType::Temperature => "temperature",
            VitalType::BloodPressure => "blood_pressure",
            VitalType::HeartRate => "heart_rate",
            VitalType::BloodGlucose => "blood_glucose",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "temperature" => Some(VitalType::Temperature),
            "blood_pressure" => Some(VitalType::BloodPressure),
            "heart_rate" => Some(VitalType::HeartRate),
            "blood_glucose" => Some(VitalType::BloodGlucose),
            _ => None,
        }
    }

    /// Default unit for this vital type.
    pub fn default_unit(self) -> VitalUnit {
        match self {
            VitalType::Temperature => VitalUnit::Fahrenheit,
            VitalType::BloodPressure => VitalUnit::MmHg,
            VitalType::HeartRate => VitalUnit::Bpm,
            VitalType::BloodGlucose => VitalUnit::MgPerDl,
        }
    }
}

/// Measurement unit. Reference ranges are expressed in the default unit of each type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalUnit {
    Fahrenheit,
    Celsius,
    MmHg,
    Bpm,
    MgPerDl,
    MmolPerL,
}

/// mg/dL per mmol/L for blood glucose.
const GLUCOSE_MMOL_TO_MG: f64 = 18.0;

impl VitalUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            VitalUnit::Fahrenheit => "°F",
            VitalUnit::Celsius => "°C",
            VitalUnit::MmHg => "mmHg",
            VitalUnit::Bpm => "BPM",
            VitalUnit::MgPerDl => "mg/dL",
            VitalUnit::MmolPerL => "mmol/L",
        }
    }

    /// Whether a reading of `vital` may be expressed in this unit.
    pub fn applies_to(self, vital: VitalType) -> bool {
        matches!(
            (vital, self),
            (VitalType::Temperature, VitalUnit::Fahrenheit | VitalUnit::Celsius)
                | (VitalType::BloodPressure, VitalUnit::MmHg)
                | (VitalType::HeartRate, VitalUnit::Bpm)
                | (VitalType::BloodGlucose, VitalUnit::MgPerDl | VitalUnit::MmolPerL)
        )
    }

    /// Convert a value in this unit to the default unit of its vital type.
    fn to_canonical(self, value: f64) -> f64 {
        match self {
            VitalUnit::Celsius => value * 9.0 / 5.0 + 32.0,
            VitalUnit::MmolPerL => value * GLUCOSE_MMOL_TO_MG,
            _ => value,
        }
    }
}

/// Per-metric reference ranges, in each type's default unit. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceRanges {
    pub temperature_max_f: f64,
    pub systolic_max: f64,
    pub diastolic_max: f64,
    pub heart_rate_min: f64,
    pub heart_rate_max: f64,
    pub glucose_min: f64,
    pub glucose_max: f64,
}

impl Default for ReferenceRanges {
    fn default() -> Self {
        Self {
            temperature_max_f: 100.4,
            systolic_max: 140.0,
            diastolic_max: 90.0,
            heart_rate_min: 60.0,
            heart_rate_max: 100.0,
            glucose_min: 70.0,
            glucose_max: 140.0,
        }
    }
}

impl ReferenceRanges {
    /// Values must already be in the default unit of `vital`.
    pub fn is_normal(&self, vital: VitalType, primary: f64, secondary: Option<f64>) -> bool {
        match vital {
            VitalType::Temperature => primary <= self.temperature_max_f,
            VitalType::BloodPressure => {
                primary <= self.systolic_max
                    && secondary.map_or(true, |diastolic| diastolic <= self.diastolic_max)
            }
            VitalType::HeartRate => (self.heart_rate_min..=self.heart_rate_max).contains(&primary),
            VitalType::BloodGlucose => (self.glucose_min..=self.glucose_max).contains(&primary),
        }
    }
}

/// A single vital sign measurement. `normal` is computed once, at construction.
///
/// Deserialization goes through `VitalReading::new` with the default ranges; any
/// `normal` field in the input is ignored. Use `reassessed` for site ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VitalReadingRaw")]
pub struct VitalReading {
    vital_type: VitalType,
    value_primary: f64,
    value_secondary: Option<f64>, // diastolic for blood_pressure
    unit: VitalUnit,
    normal: bool,
}

impl VitalReading {
    pub fn new(
        vital_type: VitalType,
        value_primary: f64,
        value_secondary: Option<f64>,
        unit: VitalUnit,
        ranges: &ReferenceRanges,
    ) -> Result<Self, ModelError> {
        let invalid = |reason: String| ModelError::InvalidVital {
            vital: vital_type.as_str(),
            reason,
        };

        if !unit.applies_to(vital_type) {
            return Err(invalid(format!("unit {} does not apply", unit.symbol())));
        }
        if !value_primary.is_finite() || value_primary <= 0.0 {
            return Err(invalid(format!("value {value_primary} is not a positive number")));
        }
        match (vital_type, value_secondary) {
            (VitalType::BloodPressure, None) => {
                return Err(invalid("diastolic value is missing".into()));
            }
            (VitalType::BloodPressure, Some(diastolic)) => {
                if !diastolic.is_finite() || diastolic <= 0.0 {
                    return Err(invalid(format!("diastolic {diastolic} is not a positive number")));
                }
            }
            (_, Some(_)) => return Err(invalid("unexpected secondary value".into())),
            (_, None) => {}
        }

        let normal = ranges.is_normal(
            vital_type,
            unit.to_canonical(value_primary),
            value_secondary.map(|v| unit.to_canonical(v)),
        );

        Ok(Self {
            vital_type,
            value_primary,
            value_secondary,
            unit,
            normal,
        })
    }

    /// Shorthand for a reading in the type's default unit.
    pub fn in_default_unit(
        vital_type: VitalType,
        value_primary: f64,
        value_secondary: Option<f64>,
        ranges: &ReferenceRanges,
    ) -> Result<Self, ModelError> {
        Self::new(
            vital_type,
            value_primary,
            value_secondary,
            vital_type.default_unit(),
            ranges,
        )
    }

    /// Same measurement, flagged against other reference ranges.
    pub fn reassessed(&self, ranges: &ReferenceRanges) -> Self {
        Self {
            normal: ranges.is_normal(
                self.vital_type,
                self.unit.to_canonical(self.value_primary),
                self.value_secondary.map(|v| self.unit.to_canonical(v)),
            ),
            ..self.clone()
        }
    }

    pub fn vital_type(&self) -> VitalType {
        self.vital_type
    }

    pub fn value_primary(&self) -> f64 {
        self.value_primary
    }

    pub fn value_secondary(&self) -> Option<f64> {
        self.value_secondary
    }

    pub fn unit(&self) -> VitalUnit {
        self.unit
    }

    pub fn is_normal(&self) -> bool {
        self.normal
    }

    /// Display form, e.g. `101.5 °F` or `140/90 mmHg`.
    pub fn display_value(&self) -> String {
        match self.value_secondary {
            Some(secondary) => format!(
                "{}/{} {}",
                self.value_primary,
                secondary,
                self.unit.symbol()
            ),
            None => format!("{} {}", self.value_primary, self.unit.symbol()),
        }
    }
}

/// Inbound form of a reading. Unit defaults to the type's default unit.
#[derive(Deserialize)]
struct VitalReadingRaw {
    vital_type: VitalType,
    value_primary: f64,
    #[serde(default)]
    value_secondary: Option<f64>,
    #[serde(default)]
    unit: Option<VitalUnit>,
}

impl TryFrom<VitalReadingRaw> for VitalReading {
    type Error = ModelError;

    fn try_from(raw: VitalReadingRaw) -> Result<Self, Self::Error> {
        Self::new(
            raw.vital_type,
            raw.value_primary,
            raw.value_secondary,
            raw.unit.unwrap_or(raw.vital_type.default_unit()),
            &ReferenceRanges::default(),
        )
    }
}

/// Timestamped set of readings, at most one per vital type. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VitalsSnapshotRaw")]
pub struct VitalsSnapshot {
    taken_at: DateTime<Utc>,
    readings: Vec<VitalReading>,
}

impl VitalsSnapshot {
    pub fn new(taken_at: DateTime<Utc>, readings: Vec<VitalReading>) -> Result<Self, ModelError> {
        if readings.is_empty() {
            return Err(ModelError::EmptySnapshot);
        }
        for (i, reading) in readings.iter().enumerate() {
            if readings[..i]
                .iter()
                .any(|earlier| earlier.vital_type == reading.vital_type)
            {
                return Err(ModelError::DuplicateVital(reading.vital_type.as_str()));
            }
        }
        Ok(Self { taken_at, readings })
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn readings(&self) -> &[VitalReading] {
        &self.readings
    }

    pub fn reading(&self, vital_type: VitalType) -> Option<&VitalReading> {
        self.readings.iter().find(|r| r.vital_type == vital_type)
    }

    pub fn has_abnormal(&self) -> bool {
        self.readings.iter().any(|r| !r.normal)
    }

    pub fn abnormal_readings(&self) -> impl Iterator<Item = &VitalReading> {
        self.readings.iter().filter(|r| !r.normal)
    }

    /// Same readings, flagged against other reference ranges.
    pub fn reassessed(&self, ranges: &ReferenceRanges) -> Self {
        Self {
            taken_at: self.taken_at,
            readings: self.readings.iter().map(|r| r.reassessed(ranges)).collect(),
        }
    }
}

#[derive(Deserialize)]
struct VitalsSnapshotRaw {
    taken_at: DateTime<Utc>,
    readings: Vec<VitalReading>,
}

impl TryFrom<VitalsSnapshotRaw> for VitalsSnapshot {
    type Error = ModelError;

    fn try_from(raw: VitalsSnapshotRaw) -> Result<Self, Self::Error> {
        Self::new(raw.taken_at, raw.readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges() -> ReferenceRanges {
        ReferenceRanges::default()
    }

    fn reading(vital: VitalType, primary: f64, secondary: Option<f64>) -> VitalReading {
        VitalReading::in_default_unit(vital, primary, secondary, &ranges()).unwrap()
    }

    // =================================================================
    // REFERENCE RANGES
    // =================================================================

    #[test]
    fn temperature_threshold_is_exclusive() {
        assert!(reading(VitalType::Temperature, 100.4, None).is_normal());
        assert!(!reading(VitalType::Temperature, 101.5, None).is_normal());
    }

    #[test]
    fn celsius_converted_before_range_check() {
        let mild = VitalReading::new(VitalType::Temperature, 37.0, None, VitalUnit::Celsius, &ranges())
            .unwrap();
        let febrile =
            VitalReading::new(VitalType::Temperature, 38.6, None, VitalUnit::Celsius, &ranges())
                .unwrap();
        assert!(mild.is_normal());
        assert!(!febrile.is_normal());
    }

    #[test]
    fn blood_pressure_checks_both_values() {
        assert!(reading(VitalType::BloodPressure, 120.0, Some(80.0)).is_normal());
        assert!(reading(VitalType::BloodPressure, 140.0, Some(90.0)).is_normal());
        assert!(!reading(VitalType::BloodPressure, 145.0, Some(80.0)).is_normal());
        assert!(!reading(VitalType::BloodPressure, 130.0, Some(95.0)).is_normal());
    }

    #[test]
    fn heart_rate_outside_band_is_abnormal() {
        assert!(reading(VitalType::HeartRate, 72.0, None).is_normal());
        assert!(!reading(VitalType::HeartRate, 55.0, None).is_normal());
        assert!(!reading(VitalType::HeartRate, 120.0, None).is_normal());
    }

    #[test]
    fn glucose_band_and_mmol_conversion() {
        assert!(reading(VitalType::BloodGlucose, 95.0, None).is_normal());
        assert!(!reading(VitalType::BloodGlucose, 180.0, None).is_normal());
        assert!(!reading(VitalType::BloodGlucose, 60.0, None).is_normal());
        let mmol =
            VitalReading::new(VitalType::BloodGlucose, 10.0, None, VitalUnit::MmolPerL, &ranges())
                .unwrap();
        assert!(!mmol.is_normal());
    }

    #[test]
    fn reassessed_applies_site_ranges() {
        let strict = ReferenceRanges {
            temperature_max_f: 99.5,
            ..ReferenceRanges::default()
        };
        let r = reading(VitalType::Temperature, 100.0, None);
        assert!(r.is_normal());
        assert!(!r.reassessed(&strict).is_normal());

        let snapshot = VitalsSnapshot::new(Utc::now(), vec![r]).unwrap();
        assert!(snapshot.reassessed(&strict).has_abnormal());
        assert!(!snapshot.has_abnormal());
    }

    #[test]
    fn custom_ranges_respected() {
        let strict = ReferenceRanges {
            temperature_max_f: 99.5,
            ..ReferenceRanges::default()
        };
        let r = VitalReading::in_default_unit(VitalType::Temperature, 100.0, None, &strict).unwrap();
        assert!(!r.is_normal());
    }

    // =================================================================
    // MALFORMED READINGS
    // =================================================================

    #[test]
    fn blood_pressure_requires_diastolic() {
        let err =
            VitalReading::in_default_unit(VitalType::BloodPressure, 120.0, None, &ranges()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidVital { vital: "blood_pressure", .. }));
    }

    #[test]
    fn non_finite_and_negative_rejected() {
        for bad in [f64::NAN, f64::INFINITY, -3.0, 0.0] {
            assert!(
                VitalReading::in_default_unit(VitalType::HeartRate, bad, None, &ranges()).is_err(),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn mismatched_unit_rejected() {
        let err = VitalReading::new(VitalType::HeartRate, 80.0, None, VitalUnit::MmHg, &ranges())
            .unwrap_err();
        assert!(err.to_string().contains("mmHg"));
    }

    #[test]
    fn secondary_value_only_for_blood_pressure() {
        assert!(
            VitalReading::in_default_unit(VitalType::HeartRate, 80.0, Some(1.0), &ranges()).is_err()
        );
    }

    // =================================================================
    // SNAPSHOTS
    // =================================================================

    #[test]
    fn snapshot_flags_any_abnormal_reading() {
        let snapshot = VitalsSnapshot::new(
            Utc::now(),
            vec![
                reading(VitalType::Temperature, 101.5, None),
                reading(VitalType::BloodPressure, 120.0, Some(80.0)),
                reading(VitalType::HeartRate, 88.0, None),
                reading(VitalType::BloodGlucose, 95.0, None),
            ],
        )
        .unwrap();
        assert!(snapshot.has_abnormal());
        let abnormal: Vec<_> = snapshot.abnormal_readings().collect();
        assert_eq!(abnormal.len(), 1);
        assert_eq!(abnormal[0].vital_type(), VitalType::Temperature);
        assert_eq!(
            snapshot.reading(VitalType::HeartRate).map(|r| r.value_primary()),
            Some(88.0)
        );
    }

    #[test]
    fn snapshot_rejects_empty_and_duplicates() {
        assert_eq!(
            VitalsSnapshot::new(Utc::now(), vec![]).unwrap_err(),
            ModelError::EmptySnapshot
        );
        let err = VitalsSnapshot::new(
            Utc::now(),
            vec![
                reading(VitalType::HeartRate, 70.0, None),
                reading(VitalType::HeartRate, 72.0, None),
            ],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::DuplicateVital("heart_rate"));
    }

    #[test]
    fn display_value_formats() {
        assert_eq!(
            reading(VitalType::BloodPressure, 140.0, Some(90.0)).display_value(),
            "140/90 mmHg"
        );
        assert_eq!(reading(VitalType::Temperature, 101.5, None).display_value(), "101.5 °F");
    }

    #[test]
    fn vital_type_round_trip() {
        for vital in [
            VitalType::Temperature,
            VitalType::BloodPressure,
            VitalType::HeartRate,
            VitalType::BloodGlucose,
        ] {
            assert_eq!(VitalType::from_str(vital.as_str()), Some(vital));
        }
        assert_eq!(VitalType::from_str("weight"), None);
    }

    // =================================================================
    // SERDE
    // =================================================================

    #[test]
    fn snapshot_json_round_trip() {
        let snapshot = VitalsSnapshot::new(
            Utc::now(),
            vec![
                reading(VitalType::Temperature, 101.5, None),
                reading(VitalType::BloodPressure, 120.0, Some(80.0)),
            ],
        )
        .unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: VitalsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn forged_normal_flag_is_recomputed() {
        let json = r#"{"vital_type":"temperature","value_primary":103.0,"unit":"fahrenheit","normal":true}"#;
        let r: VitalReading = serde_json::from_str(json).unwrap();
        assert!(!r.is_normal());

        let json = r#"{"vital_type":"blood_glucose","value_primary":10.0,"unit":"mmol_per_l","normal":true}"#;
        let r: VitalReading = serde_json::from_str(json).unwrap();
        assert!(!r.is_normal());
    }

    #[test]
    fn missing_unit_defaults_per_type() {
        let r: VitalReading =
            serde_json::from_str(r#"{"vital_type":"heart_rate","value_primary":72}"#).unwrap();
        assert_eq!(r.unit(), VitalUnit::Bpm);
        assert!(r.is_normal());
    }

    #[test]
    fn invalid_json_readings_rejected() {
        for json in [
            r#"{"vital_type":"blood_pressure","value_primary":120}"#,
            r#"{"vital_type":"heart_rate","value_primary":-5}"#,
            r#"{"vital_type":"heart_rate","value_primary":80,"unit":"mm_hg"}"#,
        ] {
            assert!(serde_json::from_str::<VitalReading>(json).is_err(), "accepted {json}");
        }
    }

    #[test]
    fn invalid_json_snapshots_rejected() {
        let empty = r#"{"taken_at":"2025-01-10T10:00:00Z","readings":[]}"#;
        assert!(serde_json::from_str::<VitalsSnapshot>(empty).is_err());

        let duplicate = r#"{"taken_at":"2025-01-10T10:00:00Z","readings":[
            {"vital_type":"heart_rate","value_primary":70},
            {"vital_type":"heart_rate","value_primary":90}]}"#;
        let err = serde_json::from_str::<VitalsSnapshot>(duplicate).unwrap_err();
        assert!(err.to_string().contains("heart_rate"));
    }
}
