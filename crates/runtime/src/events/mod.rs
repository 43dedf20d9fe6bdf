//! Signal bus for content and combat events.
//!
//! Publishers name a [`Signal`] kind; subscribers register a handler per
//! kind. Delivery is synchronous and ordered.

mod bus;
mod signal;

pub use bus::{SignalBus, SignalHandler, SubscriptionId};
pub use signal::{Signal, SignalRecord};
