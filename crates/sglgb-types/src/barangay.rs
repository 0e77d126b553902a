//! Barangays registered for assessment

use crate::BarangayId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A barangay local government unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Barangay {
    pub id: BarangayId,
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

impl Barangay {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BarangayId::generate(),
            name: name.into(),
            registered_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: BarangayId) -> Self {
        self.id = id;
        self
    }
}
