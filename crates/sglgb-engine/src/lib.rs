//! SGLGB Assessment Lifecycle Engine
//!
//! Drives an assessment from the BLGU's first answer to the administrator's
//! finalization:
//!
//! ```text
//! in_progress  --submit------------------------> submitted
//! submitted    --close_review (all Pass)-------> validated
//! submitted    --close_review (any non-Pass)---> needs_rework
//! needs_rework --submit (flagged complete)-----> submitted
//! validated    --finalize----------------------> finalized
//! ```
//!
//! The engine is split the same way the rules are:
//!
//! - [`StateMachine`]: pure transition and permission rules over an
//!   [`Assessment`](sglgb_types::Assessment) value. No I/O.
//! - [`compute_validation`], [`classify`], [`progress`]: pure read-side
//!   functions (submission gate, seal determination, dashboard metrics).
//! - [`LifecycleEngine`]: the async controller. Wraps every mutation in a
//!   per-assessment unit of work against a [`Store`], talks to the
//!   [`EvidenceGateway`] and publishes [`LifecycleEvent`]s.

#![deny(unsafe_code)]

pub mod classification;
pub mod completeness;
pub mod engine;
pub mod events;
pub mod gateway;
pub mod policy;
pub mod progress;
pub mod state_machine;
pub mod store;

pub use classification::classify;
pub use completeness::{compute_validation, unreviewed_responses, ValidationSummary};
pub use engine::{ActivationReport, LifecycleEngine, QueueItem};
pub use events::LifecycleEvent;
pub use gateway::{
    EvidenceGateway, EvidenceMetadata, EvidenceUpload, GatewayError, GatewayResult,
    InMemoryEvidenceGateway,
};
pub use policy::EnginePolicy;
pub use progress::{progress, AreaProgress, ProgressMetrics};
pub use state_machine::{RecordOutcome, ReviewOutcome, StateMachine};
pub use store::{InMemoryStore, Store, StoreBatch, StoreError, StoreResult};
