//! Delivery of lifecycle responses back to the orchestration layer.
//!
//! - [`ResponseReporter`] — the seam the lifecycle handler reports through.
//! - [`CallbackReporter`] — HTTP PUT to the event's callback URL with a
//!   fixed-attempt retry policy.
//! - [`DeliveryOutcome`] — typed result of a delivery, including the
//!   exhausted-retry case.

pub mod delivery;

pub use delivery::callback::{CallbackReporter, DeliveryError, DeliveryOutcome, ResponseReporter};
