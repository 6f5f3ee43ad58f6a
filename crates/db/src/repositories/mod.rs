//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Methods that must run
//! inside a caller-owned transaction take `&mut PgConnection` instead.

pub mod annotation_repo;
pub mod job_repo;
pub mod label_pattern_repo;
pub mod model_repo;
pub mod request_repo;
pub mod task_repo;
pub mod training_data_repo;
pub mod user_repo;

pub use annotation_repo::AnnotationRepo;
pub use job_repo::JobRepo;
pub use label_pattern_repo::LabelPatternRepo;
pub use model_repo::ModelRepo;
pub use request_repo::RequestRepo;
pub use task_repo::TaskRepo;
pub use training_data_repo::TrainingDataRepo;
pub use user_repo::UserRepo;
