//! Re-exports the expansion error type from `jobsfile-model`, where it
//! lives so both this crate and `jobsfile` can share one type without a
//! conversion at the boundary.

pub use jobsfile_model::error::ExpandError;
