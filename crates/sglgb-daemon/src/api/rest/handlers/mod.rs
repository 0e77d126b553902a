//! API request handlers

mod assessments;
mod assessor;
mod barangays;
mod catalogue;
mod health;
mod periods;
mod responses;
mod views;

pub use assessments::*;
pub use assessor::*;
pub use barangays::*;
pub use catalogue::*;
pub use health::*;
pub use periods::*;
pub use responses::*;
pub use views::*;
