//! Compiles jobs-file YAML into Jenkins job XML and reconciles it against a
//! Jenkins server.
//!
//! The pipeline is three stages, each owned by a different crate:
//!
//! 1. parse + expand (`jobsfile-model::options`, `jobsfile-expand`)
//! 2. typed descriptor + XML generation (`jobsfile-model::descriptor`, [`generator`])
//! 3. reconciliation against a live server ([`jenkins_client`])
//!
//! [`pipeline::compile`] and [`pipeline::reconcile`] wire these together;
//! `main.rs` is a thin CLI over them.

pub mod config;
pub mod error;
pub mod generator;
pub mod jenkins_client;
pub mod pipeline;

pub use error::{GeneratorError, PipelineError, ReconcileError};
pub use pipeline::{compile, CompiledJobSet};
