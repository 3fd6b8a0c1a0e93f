//! Data models shared across the jobs-file compilation pipeline: the
//! repository descriptor, the recognized-option schema and YAML front-end,
//! and the compiled job descriptor produced once matrix and conditional-key
//! expansion finish.

pub mod descriptor;
pub mod error;
pub mod options;
pub mod repository;

pub use descriptor::JobDescriptor;
pub use error::{CompileError, OptionError};
pub use repository::Repository;
