pub mod pattern;
pub mod pattern_store;

pub use pattern::{DrumClass, Hit, Pattern, LOOP_END_GUARD};
pub use pattern_store::{PatternError, RecordError};
