//! Identifier newtypes
//!
//! All identifiers are opaque strings. Generated ids are UUID v4; catalogue
//! ids (areas, indicators) are human-chosen slugs such as `financial-admin`.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// Identifier of an assessment period
    PeriodId
);
string_id!(
    /// Identifier of a barangay
    BarangayId
);
string_id!(
    /// Identifier of an assessment (one per barangay per period)
    AssessmentId
);
string_id!(
    /// Identifier of an indicator response within an assessment
    ResponseId
);
string_id!(
    /// Identifier of a catalogue indicator
    IndicatorId
);
string_id!(
    /// Identifier of a governance area
    GovernanceAreaId
);
string_id!(
    /// Identifier of an uploaded evidence file
    MovFileId
);
string_id!(
    /// Identifier of an authenticated user
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(AssessmentId::generate(), AssessmentId::generate());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = IndicatorId::new("fa-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"fa-1\"");
        assert_eq!(id.to_string(), "fa-1");
    }
}
