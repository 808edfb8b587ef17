pub mod dispatcher;
pub mod strategy;

pub use dispatcher::{DispatchError, Dispatcher, DEFAULT_BACKEND_TIMEOUT};
pub use strategy::{UnknownStrategy, VariationParams, VariationStrategy};
