//! Rapid Fire: a timed, sequential flash-recall run over a glossary.
//!
//! [`DrillMachine`] holds the state transitions and [`DrillRunner`] drives it
//! with tokio timers. A run works on its own copy of the terms and never
//! writes anything back to the session.

pub mod error;
pub mod machine;
pub mod runner;
pub mod timing;

pub use error::{DrillError, DrillResult};
pub use machine::{DrillEffect, DrillEvent, DrillMachine, DrillState};
pub use runner::{DrillHandle, DrillRunner, DrillSnapshot};
pub use timing::DrillTiming;
