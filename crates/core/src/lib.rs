//! Domain logic for the annotation request pipeline.
//!
//! This crate has zero internal deps so it can be used by the API tier,
//! the background worker, and any future CLI tooling. Everything here is
//! pure computation: scoring, candidate interleaving, assignment,
//! agreement statistics, and the task-update diff. Persistence lives in
//! `labelforge-db`.

pub mod annotation;
pub mod assign;
pub mod error;
pub mod export;
pub mod generator;
pub mod kappa;
pub mod retry;
pub mod scoring;
pub mod task_diff;
pub mod types;

pub use error::CoreError;
