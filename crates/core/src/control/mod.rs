pub mod notifier;
pub mod osc;

pub use notifier::{LogNotifier, Notifier, OscNotifier};
pub use osc::{encode_notification, notification_message, ControlDispatchTable, ControlError};
