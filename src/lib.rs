//! Finance Workflow Orchestrator
//!
//! Runs multi-stage financial workflows as background jobs:
//! - Composes a fixed stage sequence per workflow kind from a capability registry
//! - Executes each stage as one call to an external reasoning service
//! - Tracks every job from RUNNING to a single terminal state
//! - Records an audit entry per finished job
//!
//! JOB LOOP:
//! SUBMIT → VALIDATE → COMPOSE → RUNNING → EXECUTE STAGES → SUCCESS | FAILED

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod reasoning;
pub mod registry;
pub mod state;
pub mod tasks;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use orchestrator::Orchestrator;
