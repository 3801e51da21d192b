//! Literal data describing the HRIR measurement set the engine is built around.
//!
//! Nothing here is computed: the values encode the topology of the physical measurement grid, and are kept as data so
//! that they can be validated against whatever set of impulse responses is actually shipped.
mod direction_grid;

pub use direction_grid::*;
