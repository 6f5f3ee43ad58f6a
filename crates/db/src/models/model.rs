//! Scoring model registry entities.
//!
//! A `Model` row records one trained classifier version for a label;
//! `Inference` rows cache its class probabilities per text so request
//! generation never runs the classifier inline.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use labelforge_core::types::{DbId, Timestamp};

/// A row from the `models` table. `config` is the training
/// configuration snapshot taken when the version was registered.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Model {
    pub id: DbId,
    pub label: String,
    pub version: i32,
    pub config: serde_json::Value,
    pub created_at: Timestamp,
}

/// Training configuration defaults, snapshotted into `models.config`
/// at registration time so later default changes never alter the
/// recorded provenance of an existing version.
pub fn default_training_config() -> serde_json::Value {
    serde_json::json!({
        "test_size": 0.3,
        "random_state": 42,
        "train": {
            "num_train_epochs": 5,
            "max_seq_length": 512,
            "per_device_train_batch_size": 8
        }
    })
}

/// A row from the `inferences` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Inference {
    pub id: DbId,
    pub model_id: DbId,
    pub text_sha256: String,
    pub text: String,
    pub probs: serde_json::Value,
    pub created_at: Timestamp,
}

/// One cached prediction to insert for a model version.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInference {
    pub text: String,
    pub probs: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_config_snapshot_has_split_and_epochs() {
        let config = default_training_config();
        assert_eq!(config["test_size"], 0.3);
        assert_eq!(config["train"]["num_train_epochs"], 5);
    }
}
