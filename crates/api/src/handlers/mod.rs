//! HTTP handlers, one module per resource.

pub mod annotations;
pub mod jobs;
pub mod labels;
pub mod models;
pub mod tasks;
pub mod training_data;
pub mod users;
