use sqlx::PgPool;

use labelforge_core::scoring::uncertainty::text_key;
use labelforge_db::models::model::{default_training_config, NewInference};
use labelforge_db::repositories::{LabelPatternRepo, ModelRepo, TrainingDataRepo};

/// Versions per label start at 1 and increase by one.
#[sqlx::test(migrations = "./migrations")]
async fn test_model_versions_are_dense_per_label(pool: PgPool) {
    let config = default_training_config();
    let v1 = ModelRepo::create_next_version(&pool, "B2C", &config)
        .await
        .unwrap();
    let v2 = ModelRepo::create_next_version(&pool, "B2C", &config)
        .await
        .unwrap();
    let other = ModelRepo::create_next_version(&pool, "HEALTHCARE", &config)
        .await
        .unwrap();

    assert_eq!(v1.version, 1);
    assert_eq!(v2.version, 2);
    assert_eq!(other.version, 1);

    let latest = ModelRepo::latest_for_label(&pool, "B2C")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, v2.id);
}

/// Stored inferences key on the trimmed-text hash and overwrite on
/// re-insert.
#[sqlx::test(migrations = "./migrations")]
async fn test_inference_cache_upserts(pool: PgPool) {
    let model = ModelRepo::create_next_version(&pool, "B2C", &default_training_config())
        .await
        .unwrap();

    ModelRepo::store_inferences(
        &pool,
        model.id,
        &[NewInference {
            text: "A quick brown fox.".to_string(),
            probs: vec![0.9, 0.1],
        }],
    )
    .await
    .unwrap();
    ModelRepo::store_inferences(
        &pool,
        model.id,
        &[NewInference {
            text: "A quick brown fox.".to_string(),
            probs: vec![0.4, 0.6],
        }],
    )
    .await
    .unwrap();

    let cached = ModelRepo::list_inferences(&pool, model.id).await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].text_sha256, text_key("A quick brown fox."));
    assert_eq!(cached[0].probs, serde_json::json!([0.4, 0.6]));
}

/// An export row is owned by the model version that consumed it.
#[sqlx::test(migrations = "./migrations")]
async fn test_training_data_binds_to_its_model_version(pool: PgPool) {
    let model = ModelRepo::create_next_version(&pool, "B2C", &default_training_config())
        .await
        .unwrap();

    let record = TrainingDataRepo::create(&pool, "B2C", model.id, "/data/b2c.jsonl", 10, 2)
        .await
        .unwrap();
    assert_eq!(record.model_id, model.id);

    let listed = TrainingDataRepo::list_for_label(&pool, "B2C").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].model_id, model.id);

    // The FK rejects rows pointing at no model version.
    let orphan = TrainingDataRepo::create(&pool, "B2C", model.id + 1, "/data/x.jsonl", 1, 0).await;
    assert!(orphan.is_err());
}

/// Pattern lists replace wholesale per label.
#[sqlx::test(migrations = "./migrations")]
async fn test_label_patterns_replace(pool: PgPool) {
    LabelPatternRepo::set(&pool, "B2C", &["online store".to_string()])
        .await
        .unwrap();
    LabelPatternRepo::set(
        &pool,
        "B2C",
        &["web shop".to_string(), "checkout".to_string()],
    )
    .await
    .unwrap();

    let row = LabelPatternRepo::get(&pool, "B2C").await.unwrap().unwrap();
    assert_eq!(row.phrases(), vec!["web shop", "checkout"]);
    assert!(LabelPatternRepo::get(&pool, "OTHER").await.unwrap().is_none());
}
