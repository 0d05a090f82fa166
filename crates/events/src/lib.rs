//! In-process event bus and alarm notification dispatch.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the event envelope carried on the bus.
//! - [`AlarmRaised`]: typed payload of `equipment.alarm` events.
//! - [`AlarmNotifier`]: background subscriber that turns alarms into
//!   user notifications.

pub mod alarm;
pub mod bus;
pub mod notifier;

pub use alarm::{AlarmRaised, EVENT_EQUIPMENT_ALARM};
pub use bus::{EventBus, PlatformEvent};
pub use notifier::AlarmNotifier;
