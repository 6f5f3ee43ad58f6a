//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create/upsert DTO for inserts
//! - Query-parameter DTOs where the API exposes filters

pub mod annotation;
pub mod annotation_request;
pub mod job;
pub mod label_patterns;
pub mod model;
pub mod status;
pub mod task;
pub mod training_data;
pub mod user;
