use sqlx::PgPool;

use labelforge_db::models::job::{JobListQuery, SubmitJob, JOB_GENERATE_REQUESTS};
use labelforge_db::models::status::JobStatus;
use labelforge_db::repositories::JobRepo;

fn submit_generate(task_id: i64) -> SubmitJob {
    SubmitJob {
        job_type: JOB_GENERATE_REQUESTS.to_string(),
        parameters: serde_json::json!({ "task_id": task_id }),
    }
}

/// Submit, claim, run, complete: the status walks the whole lifecycle.
#[sqlx::test(migrations = "./migrations")]
async fn test_job_lifecycle(pool: PgPool) {
    let job = JobRepo::submit(&pool, &submit_generate(1)).await.unwrap();
    assert_eq!(job.status_id, JobStatus::Pending.id());
    assert!(job.claimed_at.is_none());

    let claimed = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(claimed.id, job.id);
    assert_eq!(claimed.status_id, JobStatus::Running.id());
    assert!(claimed.claimed_at.is_some());

    JobRepo::mark_started(&pool, job.id).await.unwrap();
    JobRepo::update_progress(&pool, job.id, 40).await.unwrap();
    JobRepo::complete(&pool, job.id, &serde_json::json!({ "requests": 12 }))
        .await
        .unwrap();

    let done = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(done.status_id, JobStatus::Completed.id());
    assert_eq!(done.progress_percent, 100);
    assert!(done.completed_at.is_some());
    assert_eq!(done.result, Some(serde_json::json!({ "requests": 12 })));
}

/// A claimed job is invisible to the next claimer.
#[sqlx::test(migrations = "./migrations")]
async fn test_claim_skips_claimed_jobs(pool: PgPool) {
    let first = JobRepo::submit(&pool, &submit_generate(1)).await.unwrap();
    let second = JobRepo::submit(&pool, &submit_generate(2)).await.unwrap();

    let a = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    let b = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    assert_eq!(a.id, first.id);
    assert_eq!(b.id, second.id);
    assert!(JobRepo::claim_next(&pool).await.unwrap().is_none());
}

/// Failure records the message and a terminal timestamp.
#[sqlx::test(migrations = "./migrations")]
async fn test_job_failure(pool: PgPool) {
    let job = JobRepo::submit(&pool, &submit_generate(1)).await.unwrap();
    JobRepo::claim_next(&pool).await.unwrap();
    JobRepo::fail(&pool, job.id, "task 1 not found").await.unwrap();

    let failed = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(failed.status_id, JobStatus::Failed.id());
    assert_eq!(failed.error_message.as_deref(), Some("task 1 not found"));
    assert!(failed.completed_at.is_some());
}

/// Listing filters by status and respects pagination.
#[sqlx::test(migrations = "./migrations")]
async fn test_job_listing(pool: PgPool) {
    for task_id in 1..=3 {
        JobRepo::submit(&pool, &submit_generate(task_id)).await.unwrap();
    }
    let claimed = JobRepo::claim_next(&pool).await.unwrap().unwrap();
    JobRepo::fail(&pool, claimed.id, "boom").await.unwrap();

    let failed = JobRepo::list(
        &pool,
        &JobListQuery {
            status_id: Some(JobStatus::Failed.id()),
            limit: None,
            offset: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(failed.len(), 1);

    let page = JobRepo::list(
        &pool,
        &JobListQuery {
            status_id: None,
            limit: Some(2),
            offset: Some(0),
        },
    )
    .await
    .unwrap();
    assert_eq!(page.len(), 2);
}
