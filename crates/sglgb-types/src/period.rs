//! Assessment periods

use crate::PeriodId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an assessment period
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Upcoming,
    Active,
    Archived,
}

impl PeriodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodStatus::Upcoming => "upcoming",
            PeriodStatus::Active => "active",
            PeriodStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Informational deadlines shown to BLGU users. Not enforced by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDeadlines {
    pub blgu_submission_deadline: DateTime<Utc>,
    pub rework_completion_deadline: DateTime<Utc>,
}

/// A performance year under assessment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssessmentPeriod {
    pub id: PeriodId,
    /// Year whose governance performance is assessed
    pub performance_year: i32,
    /// Year in which the assessment takes place
    pub assessment_year: i32,
    pub status: PeriodStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadlines: Option<PeriodDeadlines>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssessmentPeriod {
    pub fn new(performance_year: i32, assessment_year: i32) -> Self {
        let now = Utc::now();
        Self {
            id: PeriodId::generate(),
            performance_year,
            assessment_year,
            status: PeriodStatus::Upcoming,
            deadlines: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PeriodStatus::Active
    }

    pub fn is_archived(&self) -> bool {
        self.status == PeriodStatus::Archived
    }

    pub fn label(&self) -> String {
        format!(
            "SGLGB {} (performance year {})",
            self.assessment_year, self.performance_year
        )
    }
}
