//! SGLGB Daemon library
//!
//! This module provides the core components for the SGLGB daemon:
//! - REST API handlers over the lifecycle engine
//! - Evidence gateways (in-memory, local disk) and upload policy
//! - Configuration and server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod evidence;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
