//! Domain events emitted by the billing aggregates.

pub mod event;

pub use event::{Event, EventName};
