//! REST API over the lifecycle engine

pub mod actor;
pub mod handlers;
pub mod router;
pub mod state;

pub use actor::CurrentActor;
pub use router::create_router;
pub use state::AppState;
