//! Internal utilities for the exploration controller.
//!
//! These utilities are intentionally minimal and dependency-free to keep
//! exploration choices reproducible.

pub mod det_rng;
pub mod entropy;

pub use det_rng::DetRng;
pub use entropy::{ChoiceSource, DetChoice, OsEntropy};
