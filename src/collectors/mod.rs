pub mod collector;
pub mod meminfo;

pub use collector::{SampleError, Sampler};
pub use meminfo::{FieldError, FileError, MeminfoReader, RawFields};
