pub mod transform;

pub use transform::{
    densify, groove_preserve, humanize, mutate, random_combination, shift, simplify,
    DensifyParams, GrooveParams, HumanizeParams, MutateParams, ShiftParams, SimplifyParams,
    FILL_GAP_THRESHOLD, MIN_AUDIBLE_VELOCITY,
};
