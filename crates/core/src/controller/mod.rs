pub mod controller;
pub mod debounce;
pub mod job;
pub mod spice;

pub use controller::{ControllerHandle, GenerationController, Phase};
pub use debounce::Debouncer;
pub use job::{
    allocate_slots, backup_path, resolve_variation_dir, run_generation, variation_path,
    GenerationError, GenerationJob, GenerationOutcome, OutputTarget,
};
pub use spice::SpiceLevel;
