//! Repository for the `annotation_requests` table.
//!
//! A user's queue is replaced atomically per generation run: pending
//! rows are deleted and the fresh ranked list is inserted in one
//! transaction, so a reader never observes a half-swapped queue.
//! Completed rows survive swaps as history.

use sqlx::{PgConnection, PgPool};

use labelforge_core::types::DbId;

use crate::models::annotation_request::{AnnotationRequest, NewRequest};
use crate::models::status::RequestStatus;

/// Column list for `annotation_requests` queries.
const COLUMNS: &str = "\
    id, task_id, user_id, entity_type, entity, label, source, score, \
    order_index, context, status_id, created_at, updated_at";

/// Provides queue operations for annotation requests.
pub struct RequestRepo;

impl RequestRepo {
    /// Replace a user's pending queue with a freshly ranked list.
    ///
    /// `requests` arrives in rank order, most important first; rows are
    /// inserted in reverse so that if the insert is interrupted the
    /// surviving prefix of `order_index` values still points at the
    /// most important work. Returns the number of rows inserted.
    pub async fn swap_for_user(
        pool: &PgPool,
        task_id: DbId,
        user_id: DbId,
        entity_type: &str,
        requests: &[NewRequest],
    ) -> Result<usize, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM annotation_requests \
             WHERE task_id = $1 AND user_id = $2 AND status_id = $3",
        )
        .bind(task_id)
        .bind(user_id)
        .bind(RequestStatus::Pending.id())
        .execute(&mut *tx)
        .await?;

        for (index, request) in requests.iter().enumerate().rev() {
            sqlx::query(
                "INSERT INTO annotation_requests \
                     (task_id, user_id, entity_type, entity, label, source, \
                      score, order_index, context, status_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(task_id)
            .bind(user_id)
            .bind(entity_type)
            .bind(&request.entity)
            .bind(&request.label)
            .bind(&request.source)
            .bind(request.score)
            .bind(index as i32)
            .bind(&request.context)
            .bind(RequestStatus::Pending.id())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(requests.len())
    }

    /// Fetch a user's queue for a task, most important first. Stale
    /// rows are hidden; completed rows are included so the client can
    /// render history.
    pub async fn fetch_for_user(
        pool: &PgPool,
        task_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<AnnotationRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotation_requests \
             WHERE task_id = $1 AND user_id = $2 AND status_id != $3 \
             ORDER BY order_index ASC"
        );
        sqlx::query_as::<_, AnnotationRequest>(&query)
            .bind(task_id)
            .bind(user_id)
            .bind(RequestStatus::Stale.id())
            .fetch_all(pool)
            .await
    }

    /// Fetch only the pending rows of a user's queue.
    pub async fn fetch_pending_for_user(
        pool: &PgPool,
        task_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<AnnotationRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotation_requests \
             WHERE task_id = $1 AND user_id = $2 AND status_id = $3 \
             ORDER BY order_index ASC"
        );
        sqlx::query_as::<_, AnnotationRequest>(&query)
            .bind(task_id)
            .bind(user_id)
            .bind(RequestStatus::Pending.id())
            .fetch_all(pool)
            .await
    }

    /// Mark matching pending requests complete after an annotation
    /// lands. Matches on (user, entity_type, entity, label) across all
    /// tasks. Returns the number of rows completed.
    pub async fn complete_matching(
        conn: &mut PgConnection,
        user_id: DbId,
        entity_type: &str,
        entity: &str,
        label: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE annotation_requests \
             SET status_id = $5, updated_at = NOW() \
             WHERE user_id = $1 AND entity_type = $2 AND entity = $3 \
               AND label = $4 AND status_id = $6",
        )
        .bind(user_id)
        .bind(entity_type)
        .bind(entity)
        .bind(label)
        .bind(RequestStatus::Complete.id())
        .bind(RequestStatus::Pending.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every pending request for a task.
    pub async fn purge_pending_by_task(
        conn: &mut PgConnection,
        task_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM annotation_requests WHERE task_id = $1 AND status_id = $2",
        )
        .bind(task_id)
        .bind(RequestStatus::Pending.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a removed annotator's pending requests for a task.
    pub async fn purge_pending_by_annotator(
        conn: &mut PgConnection,
        task_id: DbId,
        username: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM annotation_requests ar \
             USING users u \
             WHERE ar.user_id = u.id AND u.username = $2 \
               AND ar.task_id = $1 AND ar.status_id = $3",
        )
        .bind(task_id)
        .bind(username)
        .bind(RequestStatus::Pending.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a removed label's pending requests for a task.
    pub async fn purge_pending_by_label(
        conn: &mut PgConnection,
        task_id: DbId,
        label: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM annotation_requests \
             WHERE task_id = $1 AND label = $2 AND status_id = $3",
        )
        .bind(task_id)
        .bind(label)
        .bind(RequestStatus::Pending.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}
