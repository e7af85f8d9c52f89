//! Intervention Gate
//!
//! Opens the calming intervention at most once per distress episode, offers
//! a breathing view and a 5-4-3-2-1 grounding exercise, and hands control
//! back to the reflection flow on close.

mod config;
mod gate;
mod grounding;

pub use config::InterventionConfig;
pub use gate::{GateState, InterventionGate, InterventionStatus, InterventionView, OpenReason};
pub use grounding::{GroundingStep, GROUNDING_STEPS};

use thiserror::Error;

/// Intervention error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterventionError {
    #[error("Intervention is not open")]
    NotOpen,
}
