pub use backend::{
    resolve_backend, BackendCapability, BackendError, BackendRequest, GenerativeBackend,
    NullBackend,
};
pub use config::{ConfigError, ConfigManager, ConfigSchema};
pub use control::{ControlDispatchTable, ControlError, LogNotifier, Notifier, OscNotifier};
pub use controller::{
    ControllerHandle, GenerationController, GenerationError, GenerationJob, GenerationOutcome,
    OutputTarget, Phase, SpiceLevel,
};
pub use generation::{
    DispatchError, Dispatcher, UnknownStrategy, VariationParams, VariationStrategy,
};
pub use messages::{ControllerEvent, ControllerMode, Notification, Settings};
// Async module system exports
pub use modules::{
    AsyncModule, FileWatchModule, ModuleEvent, ModuleId, ModuleManager, ModuleMessage, OscModule,
};
pub use pattern::{DrumClass, Hit, Pattern, PatternError};

pub mod backend;
mod config;
pub mod control;
pub mod controller;
pub mod generation;
pub mod messages;
mod modules;
pub mod pattern;
pub mod transform;
