//! # Tangshi Common Library
//!
//! Shared code for the Tangshi poem card services including:
//! - Error types
//! - Configuration file resolution
//! - Per-action request lifecycle (search, illustrate, speak, export)
//! - Lifecycle events and the event bus

pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;

pub use error::{Error, Result};
pub use lifecycle::{ActionKind, ActionState, ActionTracker, Completion, OverlapPolicy, Ticket};
