//! Matrix and conditional-key expansion for jobs-file YAML documents.
//!
//! Given a parsed document (`jobsfile_model::options::parse_document`) and
//! the repository it belongs to, [`expand::expand_document`] enumerates the
//! matrix's cartesian product, resolves every conditional key against each
//! row, substitutes `{placeholder}` templates, and applies
//! `branch_patterns`/`exclude` filtering — producing one [`expand::ResolvedJob`]
//! per surviving row.

pub mod condition;
pub mod conditional;
pub mod error;
pub mod expand;
pub mod matrix;
pub mod template;

pub use error::ExpandError;
pub use expand::{expand_document, ResolvedJob};
pub use matrix::{Matrix, MatrixRow};
