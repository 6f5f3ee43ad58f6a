//! Repository for the `annotations` table.
//!
//! Upserts key on (entity_type, entity, label, user); a re-submission
//! overwrites the previous judgment in place. Every upsert also
//! completes the matching pending requests in the same transaction, so
//! a queue never shows work the user already did.

use std::collections::BTreeMap;

use sqlx::{PgConnection, PgPool};

use labelforge_core::annotation::TieBreak;
use labelforge_core::export::AggregatedVote;
use labelforge_core::types::DbId;

use crate::models::annotation::{Annotation, UpsertAnnotation};
use crate::repositories::{RequestRepo, UserRepo};

/// Column list for `annotations` queries, joined with the username.
const COLUMNS: &str = "\
    a.id, a.user_id, u.username, a.entity_type, a.entity, a.label, \
    a.value, a.weight, a.context, a.created_at, a.updated_at";

/// Provides upsert and aggregation operations for annotations.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Upsert one annotation and complete its matching pending
    /// requests.
    pub async fn upsert(pool: &PgPool, input: &UpsertAnnotation) -> Result<Annotation, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let annotation = Self::upsert_tx(&mut tx, input).await?;
        tx.commit().await?;
        Ok(annotation)
    }

    /// Upsert a batch in one transaction. Either every annotation lands
    /// or none do.
    pub async fn upsert_bulk(
        pool: &PgPool,
        inputs: &[UpsertAnnotation],
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut saved = Vec::with_capacity(inputs.len());
        for input in inputs {
            saved.push(Self::upsert_tx(&mut tx, input).await?);
        }
        tx.commit().await?;
        Ok(saved)
    }

    async fn upsert_tx(
        conn: &mut PgConnection,
        input: &UpsertAnnotation,
    ) -> Result<Annotation, sqlx::Error> {
        let user = UserRepo::get_or_create_tx(conn, &input.username).await?;

        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO annotations \
                 (user_id, entity_type, entity, label, value, weight, context) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT ON CONSTRAINT uq_annotations_entity_label_user \
             DO UPDATE SET value = EXCLUDED.value, weight = EXCLUDED.weight, \
                           context = EXCLUDED.context, updated_at = NOW() \
             RETURNING id",
        )
        .bind(user.id)
        .bind(&input.entity_type)
        .bind(&input.entity)
        .bind(&input.label)
        .bind(input.value)
        .bind(input.weight)
        .bind(&input.context)
        .fetch_one(&mut *conn)
        .await?;

        // An Unsure (0) vote still answers the request.
        if input.value.is_some() {
            RequestRepo::complete_matching(
                conn,
                user.id,
                &input.entity_type,
                &input.entity,
                &input.label,
            )
            .await?;
        }

        let query = format!(
            "SELECT {COLUMNS} FROM annotations a \
             JOIN users u ON u.id = a.user_id \
             WHERE a.id = $1"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(row.0)
            .fetch_one(conn)
            .await
    }

    /// List a label's annotations, newest first, optionally narrowed to
    /// one annotator and/or one entity. The agreement matrix links
    /// resolve here.
    pub async fn list_by_label(
        pool: &PgPool,
        label: &str,
        username: Option<&str>,
        entity: Option<&str>,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotations a \
             JOIN users u ON u.id = a.user_id \
             WHERE a.label = $1 \
               AND ($2::TEXT IS NULL OR u.username = $2) \
               AND ($3::TEXT IS NULL OR a.entity = $3) \
             ORDER BY a.updated_at DESC"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(label)
            .bind(username)
            .bind(entity)
            .fetch_all(pool)
            .await
    }

    /// Weighted majority vote per entity for a label.
    ///
    /// Unsure (0) and NULL values carry no weight; entities with only
    /// such votes are omitted. `weight` in the result is the total
    /// decisive weight, both sides included. Ties go to the configured
    /// side.
    pub async fn aggregate_label(
        pool: &PgPool,
        label: &str,
        tie_break: TieBreak,
    ) -> Result<Vec<AggregatedVote>, sqlx::Error> {
        let rows: Vec<(String, i32, f64)> = sqlx::query_as(
            "SELECT entity, \
                    CASE WHEN pos > neg THEN 1 \
                         WHEN neg > pos THEN -1 \
                         ELSE $2 END AS value, \
                    pos + neg AS weight \
             FROM ( \
                 SELECT entity, \
                        COALESCE(SUM(weight) FILTER (WHERE value = 1), 0)::DOUBLE PRECISION AS pos, \
                        COALESCE(SUM(weight) FILTER (WHERE value = -1), 0)::DOUBLE PRECISION AS neg \
                 FROM annotations \
                 WHERE label = $1 \
                 GROUP BY entity \
             ) sums \
             WHERE pos + neg > 0 \
             ORDER BY entity",
        )
        .bind(label)
        .bind(tie_break.decided_value())
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(entity, value, weight)| AggregatedVote {
                entity,
                value,
                weight,
            })
            .collect())
    }

    /// Votes for a label grouped by user then entity, for the
    /// agreement matrix. NULL placeholders are excluded here; Unsure
    /// (0) votes pass through so the matrix code can drop the pairs
    /// they poison.
    pub async fn votes_by_user(
        pool: &PgPool,
        label: &str,
    ) -> Result<BTreeMap<String, BTreeMap<String, i32>>, sqlx::Error> {
        let rows: Vec<(String, String, i32)> = sqlx::query_as(
            "SELECT u.username, a.entity, a.value \
             FROM annotations a \
             JOIN users u ON u.id = a.user_id \
             WHERE a.label = $1 AND a.value IS NOT NULL \
             ORDER BY u.username, a.entity",
        )
        .bind(label)
        .fetch_all(pool)
        .await?;
        let mut grouped: BTreeMap<String, BTreeMap<String, i32>> = BTreeMap::new();
        for (username, entity, value) in rows {
            grouped.entry(username).or_default().insert(entity, value);
        }
        Ok(grouped)
    }

    /// (username, entity) pairs already annotated under any of the
    /// given labels. The generator skips these when assigning.
    pub async fn annotated_pairs(
        pool: &PgPool,
        entity_type: &str,
        labels: &[String],
    ) -> Result<Vec<(String, String)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT DISTINCT u.username, a.entity \
             FROM annotations a \
             JOIN users u ON u.id = a.user_id \
             WHERE a.entity_type = $1 AND a.label = ANY($2) AND a.value IS NOT NULL",
        )
        .bind(entity_type)
        .bind(labels)
        .fetch_all(pool)
        .await
    }

    /// Latest recorded text per entity, from the context blobs. The
    /// exporter uses this to attach text to aggregated votes.
    pub async fn texts_by_entity(
        pool: &PgPool,
        label: &str,
    ) -> Result<BTreeMap<String, String>, sqlx::Error> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT DISTINCT ON (entity) entity, context->>'text' \
             FROM annotations \
             WHERE label = $1 \
             ORDER BY entity, updated_at DESC",
        )
        .bind(label)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(entity, text)| match text {
                Some(text) if !text.is_empty() => Some((entity, text)),
                _ => None,
            })
            .collect())
    }
}
