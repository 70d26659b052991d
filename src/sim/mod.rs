//! Deterministic core
//!
//! Everything the experience decides lives here. This module must stay pure:
//! - Time comes in as session milliseconds from the host
//! - Randomness comes from an injected or seeded RNG
//! - No rendering or platform dependencies

pub mod evasion;
pub mod phase;
pub mod runaway;
pub mod session;

pub use evasion::EvasionEngine;
pub use phase::{PendingTimer, Phase, PhaseChange, PhaseController, SubscriptionId};
pub use runaway::{EvasionState, Relocation, RunawayTracker, Tease};
pub use session::{Session, Visibility};
