//! Throttling of local actions
//!
//! Drops excess invocations instead of queuing them.

mod gate;

pub use gate::{throttle, ThrottleGate, Throttled};
