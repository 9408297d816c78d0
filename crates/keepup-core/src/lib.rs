//! keepup core - platform-independent supervision
//!
//! This crate provides the supervisor loop, the platform boundary trait,
//! configuration, events and error types shared by the platform-specific
//! implementations.

mod config;
mod error;
mod event;
mod platform;
mod supervisor;

pub use config::*;
pub use error::*;
pub use event::{EVENT_CHANNEL_CAPACITY, SupervisionEvent};
pub use platform::*;
pub use supervisor::{IN_FLIGHT_TICK_GRACE, SupervisionHandle, Supervisor, TickOutcome};
