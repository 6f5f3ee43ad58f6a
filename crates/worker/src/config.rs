/// Worker configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root directory for task data files (default: `./data`).
    pub data_dir: String,
    /// Maximum wall-clock seconds one job may run before it is marked
    /// failed (default: `600`).
    pub job_timeout_secs: u64,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default  |
    /// |--------------------|----------|
    /// | `DATA_DIR`         | `./data` |
    /// | `JOB_TIMEOUT_SECS` | `600`    |
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".into());

        let job_timeout_secs: u64 = std::env::var("JOB_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("JOB_TIMEOUT_SECS must be a valid u64");

        Self {
            data_dir,
            job_timeout_secs,
        }
    }
}
