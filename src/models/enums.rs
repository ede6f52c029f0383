use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        $(#[$meta])*
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// Clinical urgency. Declaration order is the total order: `Low < Medium < High`.
    #[derive(PartialOrd, Ord)]
    UrgencyLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

str_enum!(RecommendedAction {
    SelfCare => "self_care",
    ScheduleRoutine => "schedule_routine",
    EscalateUrgent => "escalate_urgent",
});

str_enum!(EntryState {
    Waiting => "waiting",
    InConsultation => "in_consultation",
    Completed => "completed",
    Abandoned => "abandoned",
});

str_enum!(
    /// Which rule resolved a triage result, highest priority first.
    TriageCategory {
        Emergency => "emergency",
        Moderate => "moderate",
        AbnormalVitals => "abnormal_vitals",
        General => "general",
    }
);

impl TriageCategory {
    /// Urgency a result resolved by this category carries.
    pub fn urgency(self) -> UrgencyLevel {
        match self {
            Self::Emergency => UrgencyLevel::High,
            Self::Moderate | Self::AbnormalVitals => UrgencyLevel::Medium,
            Self::General => UrgencyLevel::Low,
        }
    }

    pub fn action(self) -> RecommendedAction {
        match self {
            Self::Emergency => RecommendedAction::EscalateUrgent,
            Self::Moderate | Self::AbnormalVitals => RecommendedAction::ScheduleRoutine,
            Self::General => RecommendedAction::SelfCare,
        }
    }
}
