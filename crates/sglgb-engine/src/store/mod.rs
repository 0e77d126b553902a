//! Storage backends for periods, barangays and assessments.

mod memory;
mod traits;

pub use memory::InMemoryStore;
pub use traits::{
    AssessmentStore, BarangayStore, PeriodStore, Store, StoreBatch, StoreError, StoreResult,
};
