//! Repository for the `tasks` table.
//!
//! Task edits run inside one transaction: label uniqueness is checked,
//! stale pending requests are purged per the computed diff, then the
//! row is written. A failed step rolls the whole edit back.

use sqlx::{PgConnection, PgPool};

use labelforge_core::task_diff::{diff_tasks, PurgeOp, TaskFields};
use labelforge_core::types::DbId;
use labelforge_core::CoreError;

use crate::models::task::{Task, TaskInput};
use crate::repositories::RequestRepo;

/// Column list for `tasks` queries.
const COLUMNS: &str =
    "id, name, entity_type, labels, annotators, data_filenames, created_at, updated_at";

/// Errors from task writes: domain rule violations are separated from
/// database failures so the API can map them to 409/422 instead of 500.
#[derive(Debug, thiserror::Error)]
pub enum TaskWriteError {
    #[error(transparent)]
    Domain(#[from] CoreError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Provides CRUD operations for annotation tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Create a task after checking its labels are owned by no other
    /// task.
    pub async fn create(pool: &PgPool, input: &TaskInput) -> Result<Task, TaskWriteError> {
        let mut tx = pool.begin().await?;
        Self::check_label_ownership(&mut tx, None, &input.labels).await?;
        let query = format!(
            "INSERT INTO tasks (name, entity_type, labels, annotators, data_filenames) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(&input.name)
            .bind(&input.entity_type)
            .bind(serde_json::json!(input.labels))
            .bind(serde_json::json!(input.annotators))
            .bind(serde_json::json!(input.data_filenames))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(task)
    }

    /// Update a task, purging pending requests invalidated by the edit.
    ///
    /// A changed file set stales every pending request for the task;
    /// otherwise only the queues of removed annotators and requests for
    /// removed labels are purged. Completed requests are never touched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &TaskInput,
    ) -> Result<Task, TaskWriteError> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");
        let old = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "task",
                id,
            })?;

        Self::check_label_ownership(&mut tx, Some(id), &input.labels).await?;

        let old_labels = old.labels();
        let old_annotators = old.annotators();
        let old_files = old.data_filenames();
        let ops = diff_tasks(
            TaskFields {
                labels: &old_labels,
                annotators: &old_annotators,
                data_filenames: &old_files,
            },
            TaskFields {
                labels: &input.labels,
                annotators: &input.annotators,
                data_filenames: &input.data_filenames,
            },
        );
        for op in &ops {
            let purged = match op {
                PurgeOp::ByFile => RequestRepo::purge_pending_by_task(&mut tx, id).await?,
                PurgeOp::ByAnnotator(username) => {
                    RequestRepo::purge_pending_by_annotator(&mut tx, id, username).await?
                }
                PurgeOp::ByLabel(label) => {
                    RequestRepo::purge_pending_by_label(&mut tx, id, label).await?
                }
            };
            tracing::info!(task_id = id, ?op, purged, "purged stale pending requests");
        }

        let query = format!(
            "UPDATE tasks \
             SET name = $2, entity_type = $3, labels = $4, annotators = $5, \
                 data_filenames = $6, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.entity_type)
            .bind(serde_json::json!(input.labels))
            .bind(serde_json::json!(input.annotators))
            .bind(serde_json::json!(input.data_filenames))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(task)
    }

    /// Find a task by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all tasks, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks ORDER BY created_at DESC");
        sqlx::query_as::<_, Task>(&query).fetch_all(pool).await
    }

    /// Reject labels already owned by a different task. The error names
    /// the owning task so the caller can fix the overlap.
    async fn check_label_ownership(
        conn: &mut PgConnection,
        task_id: Option<DbId>,
        labels: &[String],
    ) -> Result<(), TaskWriteError> {
        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(
            "SELECT name, labels FROM tasks WHERE id IS DISTINCT FROM $1",
        )
        .bind(task_id)
        .fetch_all(conn)
        .await?;
        for (name, owned) in rows {
            let owned: Vec<String> = serde_json::from_value(owned).unwrap_or_default();
            for label in labels {
                if owned.contains(label) {
                    return Err(CoreError::Conflict(format!(
                        "label {label:?} already belongs to task {name:?}"
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}
