//! Core types for revlog.

mod memory;
mod review;

pub use memory::{ItemState, MemoryState, NextStates};
pub use review::{Grade, Phase, ReviewEvent};
