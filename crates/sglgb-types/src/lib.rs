//! SGLGB Domain Types
//!
//! The Seal of Good Local Governance for Barangays (SGLGB) assessment is a
//! two-actor workflow: a barangay (BLGU) answers a fixed catalogue of
//! governance indicators and attaches Means of Verification (MOVs), then a
//! municipal area assessor judges each answer. This crate holds the data
//! model shared by the lifecycle engine and the daemon.
//!
//! # Key Concepts
//!
//! - **IndicatorCatalogue**: governance areas (Core or Essential) and their
//!   indicators. Static reference data, snapshotted into every assessment.
//! - **AssessmentPeriod**: the performance/assessment year pair. Exactly one
//!   period is active; archived periods are read-only.
//! - **Assessment**: one per barangay per period. Owns its responses,
//!   validation records and audit history.
//! - **IndicatorResponse**: the BLGU's answer and evidence for one indicator.
//!   Its status is always derived, never stored.
//! - **ValidationRecord**: the assessor's current judgment for a response.
//!   A `Conditional` verdict cannot exist without a public comment.
//!
//! # Actors
//!
//! Every operation receives an explicit [`Actor`]. There is no ambient
//! session: identity, role and scope travel with the call.

#![deny(unsafe_code)]

mod actor;
mod assessment;
mod audit;
mod barangay;
mod catalogue;
mod errors;
mod ids;
mod period;
mod response;
mod seal;
mod validation;

pub use actor::*;
pub use assessment::*;
pub use audit::*;
pub use barangay::*;
pub use catalogue::*;
pub use errors::*;
pub use ids::*;
pub use period::*;
pub use response::*;
pub use seal::*;
pub use validation::*;
