pub mod config;
pub mod decision;
pub mod error;
pub mod payload;
pub mod types;

pub use config::{LoopConfig, SwitchSource};
pub use decision::decide;
pub use error::{ControlError, ErrorKind};
pub use payload::extract_field;
pub use types::{Action, CycleRecord, RunMode, TIMESTAMP_FORMAT};
