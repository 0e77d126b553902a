//! Assessor validation records
//!
//! A record is built through [`ValidationRecord::new`] or deserialized through
//! the same checks, so a `Conditional` verdict without a public comment cannot
//! be represented.

use crate::{LifecycleError, LifecycleResult, ResponseId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The assessor's verdict on a response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationStatus {
    Pass,
    Fail,
    /// Passes subject to a correction described in the public comment
    Conditional,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Pass => "Pass",
            ValidationStatus::Fail => "Fail",
            ValidationStatus::Conditional => "Conditional",
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current assessor judgment for one response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawValidationRecord")]
pub struct ValidationRecord {
    response_id: ResponseId,
    status: Option<ValidationStatus>,
    public_comment: Option<String>,
    internal_note: Option<String>,
    set_by: UserId,
    set_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawValidationRecord {
    response_id: ResponseId,
    #[serde(default)]
    status: Option<ValidationStatus>,
    #[serde(default)]
    public_comment: Option<String>,
    #[serde(default)]
    internal_note: Option<String>,
    set_by: UserId,
    set_at: DateTime<Utc>,
}

impl TryFrom<RawValidationRecord> for ValidationRecord {
    type Error = LifecycleError;

    fn try_from(raw: RawValidationRecord) -> Result<Self, Self::Error> {
        let mut record = ValidationRecord::new(
            raw.response_id,
            raw.status,
            raw.public_comment,
            raw.internal_note,
            raw.set_by,
        )?;
        record.set_at = raw.set_at;
        Ok(record)
    }
}

fn normalize(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

impl ValidationRecord {
    /// Build a record. Comments are trimmed; blank comments count as absent.
    pub fn new(
        response_id: ResponseId,
        status: Option<ValidationStatus>,
        public_comment: Option<String>,
        internal_note: Option<String>,
        set_by: UserId,
    ) -> LifecycleResult<Self> {
        let public_comment = normalize(public_comment);
        if status == Some(ValidationStatus::Conditional) && public_comment.is_none() {
            return Err(LifecycleError::MissingRequiredComment { response_id });
        }

        Ok(Self {
            response_id,
            status,
            public_comment,
            internal_note: normalize(internal_note),
            set_by,
            set_at: Utc::now(),
        })
    }

    pub fn with_set_at(mut self, at: DateTime<Utc>) -> Self {
        self.set_at = at;
        self
    }

    pub fn response_id(&self) -> &ResponseId {
        &self.response_id
    }

    pub fn status(&self) -> Option<ValidationStatus> {
        self.status
    }

    pub fn public_comment(&self) -> Option<&str> {
        self.public_comment.as_deref()
    }

    pub fn internal_note(&self) -> Option<&str> {
        self.internal_note.as_deref()
    }

    pub fn set_by(&self) -> &UserId {
        &self.set_by
    }

    pub fn set_at(&self) -> DateTime<Utc> {
        self.set_at
    }

    pub fn is_pass(&self) -> bool {
        self.status == Some(ValidationStatus::Pass)
    }

    /// Fail or Conditional
    pub fn reopens_response(&self) -> bool {
        matches!(
            self.status,
            Some(ValidationStatus::Fail) | Some(ValidationStatus::Conditional)
        )
    }

    /// Same verdict, comments and author; timestamps ignored
    pub fn same_judgment(&self, other: &ValidationRecord) -> bool {
        self.response_id == other.response_id
            && self.status == other.status
            && self.public_comment == other.public_comment
            && self.internal_note == other.internal_note
            && self.set_by == other.set_by
    }

    /// Copy without the internal note, for BLGU-facing views
    pub fn without_internal_note(&self) -> Self {
        Self {
            internal_note: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid() -> ResponseId {
        ResponseId::new("r-1")
    }

    #[test]
    fn test_conditional_requires_comment() {
        let err = ValidationRecord::new(
            rid(),
            Some(ValidationStatus::Conditional),
            Some("   ".into()),
            None,
            UserId::new("a"),
        )
        .unwrap_err();
        assert!(matches!(err, LifecycleError::MissingRequiredComment { .. }));

        let ok = ValidationRecord::new(
            rid(),
            Some(ValidationStatus::Conditional),
            Some(" attach signed copy ".into()),
            None,
            UserId::new("a"),
        )
        .unwrap();
        assert_eq!(ok.public_comment(), Some("attach signed copy"));
        assert!(ok.reopens_response());
    }

    #[test]
    fn test_fail_without_comment_allowed() {
        let record =
            ValidationRecord::new(rid(), Some(ValidationStatus::Fail), None, None, UserId::new("a"))
                .unwrap();
        assert!(record.reopens_response());
        assert!(!record.is_pass());
    }

    #[test]
    fn test_same_judgment_ignores_timestamp() {
        let a = ValidationRecord::new(rid(), Some(ValidationStatus::Pass), None, Some("ok".into()), UserId::new("a"))
            .unwrap();
        let b = a.clone().with_set_at(a.set_at() + chrono::Duration::minutes(5));
        assert!(a.same_judgment(&b));

        let c = ValidationRecord::new(rid(), Some(ValidationStatus::Fail), None, Some("ok".into()), UserId::new("a"))
            .unwrap();
        assert!(!a.same_judgment(&c));
    }

    #[test]
    fn test_deserialization_rejects_bare_conditional() {
        let json = r#"{"response_id":"r-1","status":"Conditional","set_by":"a","set_at":"2024-01-15T00:00:00Z"}"#;
        assert!(serde_json::from_str::<ValidationRecord>(json).is_err());

        let json = r#"{"response_id":"r-1","status":"Pass","set_by":"a","set_at":"2024-01-15T00:00:00Z"}"#;
        let record: ValidationRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_pass());
        assert_eq!(record.set_at().to_rfc3339(), "2024-01-15T00:00:00+00:00");
    }

    #[test]
    fn test_without_internal_note() {
        let record = ValidationRecord::new(
            rid(),
            Some(ValidationStatus::Fail),
            Some("missing signature".into()),
            Some("called the secretary".into()),
            UserId::new("a"),
        )
        .unwrap();
        let public = record.without_internal_note();
        assert!(public.internal_note().is_none());
        assert_eq!(public.public_comment(), Some("missing signature"));
    }
}
