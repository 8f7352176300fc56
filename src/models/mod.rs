pub mod memory;

pub use memory::{ChangeResult, MemSnapshot, TrackerState};
