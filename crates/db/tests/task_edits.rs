use sqlx::PgPool;

use labelforge_core::types::DbId;
use labelforge_db::models::annotation_request::NewRequest;
use labelforge_db::models::task::TaskInput;
use labelforge_db::models::user::CreateUser;
use labelforge_db::repositories::task_repo::TaskWriteError;
use labelforge_db::repositories::{RequestRepo, TaskRepo, UserRepo};

fn input(labels: &[&str], annotators: &[&str], files: &[&str]) -> TaskInput {
    TaskInput {
        name: "companies".to_string(),
        entity_type: "company".to_string(),
        labels: labels.iter().map(|s| s.to_string()).collect(),
        annotators: annotators.iter().map(|s| s.to_string()).collect(),
        data_filenames: files.iter().map(|s| s.to_string()).collect(),
    }
}

async fn seed_user(pool: &PgPool, username: &str) -> DbId {
    UserRepo::get_or_create(
        pool,
        &CreateUser {
            username: username.to_string(),
            display_name: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn request(entity: &str, label: &str) -> NewRequest {
    NewRequest {
        entity: entity.to_string(),
        label: label.to_string(),
        source: "random".to_string(),
        score: 0.5,
        context: serde_json::json!({}),
    }
}

/// A label can belong to one task only; the error names the owner.
#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_label_across_tasks_is_rejected(pool: PgPool) {
    TaskRepo::create(&pool, &input(&["B2C"], &["u1"], &["spring.jsonl"]))
        .await
        .unwrap();

    let mut second = input(&["B2C", "OTHER"], &["u2"], &["summer.jsonl"]);
    second.name = "more companies".to_string();
    let err = TaskRepo::create(&pool, &second).await.unwrap_err();
    match err {
        TaskWriteError::Domain(domain) => {
            let message = domain.to_string();
            assert!(message.contains("B2C"), "message was {message:?}");
            assert!(message.contains("companies"), "message was {message:?}");
        }
        other => panic!("expected a domain conflict, got {other:?}"),
    }
}

/// Editing a task without touching labels, annotators, or files keeps
/// every queue intact.
#[sqlx::test(migrations = "./migrations")]
async fn test_rename_purges_nothing(pool: PgPool) {
    let task = TaskRepo::create(&pool, &input(&["B2C"], &["u1"], &["spring.jsonl"]))
        .await
        .unwrap();
    let user_id = seed_user(&pool, "u1").await;
    RequestRepo::swap_for_user(&pool, task.id, user_id, "company", &[request("acme.com", "B2C")])
        .await
        .unwrap();

    let mut edit = input(&["B2C"], &["u1"], &["spring.jsonl"]);
    edit.name = "renamed".to_string();
    TaskRepo::update(&pool, task.id, &edit).await.unwrap();

    let pending = RequestRepo::fetch_pending_for_user(&pool, task.id, user_id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}

/// Removing an annotator purges only that user's pending queue.
#[sqlx::test(migrations = "./migrations")]
async fn test_removed_annotator_queue_is_purged(pool: PgPool) {
    let task = TaskRepo::create(&pool, &input(&["B2C"], &["u1", "u3"], &["spring.jsonl"]))
        .await
        .unwrap();
    let u1 = seed_user(&pool, "u1").await;
    let u3 = seed_user(&pool, "u3").await;
    RequestRepo::swap_for_user(&pool, task.id, u1, "company", &[request("acme.com", "B2C")])
        .await
        .unwrap();
    RequestRepo::swap_for_user(&pool, task.id, u3, "company", &[request("fox.com", "B2C")])
        .await
        .unwrap();

    TaskRepo::update(&pool, task.id, &input(&["B2C"], &["u1"], &["spring.jsonl"]))
        .await
        .unwrap();

    let kept = RequestRepo::fetch_pending_for_user(&pool, task.id, u1)
        .await
        .unwrap();
    assert_eq!(kept.len(), 1);
    let purged = RequestRepo::fetch_pending_for_user(&pool, task.id, u3)
        .await
        .unwrap();
    assert!(purged.is_empty());
}

/// A changed data-file set stales every pending request for the task.
#[sqlx::test(migrations = "./migrations")]
async fn test_file_change_purges_all_pending(pool: PgPool) {
    let task = TaskRepo::create(&pool, &input(&["B2C"], &["u1", "u2"], &["spring.jsonl"]))
        .await
        .unwrap();
    let u1 = seed_user(&pool, "u1").await;
    let u2 = seed_user(&pool, "u2").await;
    RequestRepo::swap_for_user(&pool, task.id, u1, "company", &[request("acme.com", "B2C")])
        .await
        .unwrap();
    RequestRepo::swap_for_user(&pool, task.id, u2, "company", &[request("fox.com", "B2C")])
        .await
        .unwrap();

    TaskRepo::update(&pool, task.id, &input(&["B2C"], &["u1", "u2"], &["summer.jsonl"]))
        .await
        .unwrap();

    for user_id in [u1, u2] {
        let pending = RequestRepo::fetch_pending_for_user(&pool, task.id, user_id)
            .await
            .unwrap();
        assert!(pending.is_empty());
    }
}

/// Removing a label purges its pending requests and leaves other
/// labels alone.
#[sqlx::test(migrations = "./migrations")]
async fn test_removed_label_requests_are_purged(pool: PgPool) {
    let task = TaskRepo::create(
        &pool,
        &input(&["B2C", "HEALTHCARE"], &["u1"], &["spring.jsonl"]),
    )
    .await
    .unwrap();
    let u1 = seed_user(&pool, "u1").await;
    RequestRepo::swap_for_user(
        &pool,
        task.id,
        u1,
        "company",
        &[request("acme.com", "B2C"), request("fox.com", "HEALTHCARE")],
    )
    .await
    .unwrap();

    TaskRepo::update(&pool, task.id, &input(&["B2C"], &["u1"], &["spring.jsonl"]))
        .await
        .unwrap();

    let pending = RequestRepo::fetch_pending_for_user(&pool, task.id, u1)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].label, "B2C");
}
