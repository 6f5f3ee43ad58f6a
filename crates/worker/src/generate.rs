//! The `generate_requests` job: score, rank, interleave, assign, and
//! swap per-annotator request queues for one task.
//!
//! Scoring models are keyed to the task's first label: Random always
//! runs, Pattern runs when that label has phrases configured, and
//! Uncertainty runs when a registered model has cached inferences for
//! it. Each assigned candidate becomes one request per task label, so
//! an annotator answers every label for an entity in one sitting.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::PgPool;
use thiserror::Error;

use labelforge_core::assign::assign;
use labelforge_core::generator::{rank, Candidate, CandidateStream};
use labelforge_core::scoring::{PatternModel, ScoreSource, ScoringModel, UncertaintyModel};
use labelforge_core::types::DbId;

use labelforge_db::models::annotation_request::NewRequest;
use labelforge_db::models::job::GenerateRequestsParams;
use labelforge_db::models::user::CreateUser;
use labelforge_db::repositories::{
    AnnotationRepo, JobRepo, LabelPatternRepo, ModelRepo, RequestRepo, TaskRepo, UserRepo,
};

use crate::config::WorkerConfig;
use crate::datafile::{parse_lines, DataLine};

/// Failure of a background job. The message lands in the job row's
/// `error_message` column.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("task {0} not found")]
    TaskNotFound(DbId),

    #[error("task {0} has no labels")]
    NoLabels(DbId),

    #[error("data file {fname}: {source}")]
    DataFile {
        fname: String,
        source: std::io::Error,
    },

    #[error("invalid job parameters: {0}")]
    Parameters(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Run one `generate_requests` job. Returns the result payload stored
/// on the job row.
///
/// Each annotator's queue swap is its own transaction, so a failure
/// partway leaves the already-swapped queues in place and the rest
/// untouched.
pub async fn run_generate(
    pool: &PgPool,
    config: &WorkerConfig,
    job_id: DbId,
    params: &GenerateRequestsParams,
) -> Result<serde_json::Value, JobError> {
    let task = TaskRepo::find_by_id(pool, params.task_id)
        .await?
        .ok_or(JobError::TaskNotFound(params.task_id))?;

    let labels = task.labels();
    let annotators = task.annotators();
    if labels.is_empty() {
        return Err(JobError::NoLabels(task.id));
    }
    let primary = &labels[0];

    // 1. Load and parse every bound data file.
    let mut lines: Vec<DataLine> = Vec::new();
    let mut skipped = 0usize;
    for fname in task.data_filenames() {
        let path = Path::new(&config.data_dir).join(&fname);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| JobError::DataFile {
                fname: fname.clone(),
                source,
            })?;
        let (parsed, file_skipped) = parse_lines(&fname, &contents);
        lines.extend(parsed);
        skipped += file_skipped;
    }
    tracing::info!(
        task_id = task.id,
        lines = lines.len(),
        skipped,
        "Data files loaded"
    );
    JobRepo::update_progress(pool, job_id, 10).await?;

    // 2. Build the scoring models available for the primary label.
    let models = build_models(pool, primary).await?;

    // 3. Score every line under every model, then rank per source. The
    //    pattern model's tokens and matched spans decorate every
    //    candidate for the line, whichever source ends up drawing it.
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();

    let mut scored_by_source = Vec::with_capacity(models.len());
    let mut not_scored = 0usize;
    for model in &models {
        scored_by_source.push((model.source(), model.score(&texts, &mut rng)));
        if let ScoringModel::Uncertainty(m) = model {
            not_scored = m.not_scored_count();
        }
    }
    let pattern_details: Vec<Option<serde_json::Value>> = scored_by_source
        .iter()
        .find(|(source, _)| *source == ScoreSource::Pattern)
        .map(|(_, scored)| {
            scored
                .iter()
                .map(|s| {
                    s.pattern_info
                        .as_ref()
                        .and_then(|info| serde_json::to_value(info).ok())
                })
                .collect()
        })
        .unwrap_or_else(|| vec![None; lines.len()]);

    let mut ranked = Vec::with_capacity(scored_by_source.len());
    for (source, scored) in scored_by_source {
        let candidates: Vec<Candidate> = lines
            .iter()
            .zip(scored)
            .zip(&pattern_details)
            .map(|((line, s), details)| Candidate {
                fname: line.fname.clone(),
                line_number: line.line_number,
                entity: line.entity.clone(),
                score: s.score,
                source,
                text: line.text.clone(),
                meta: line.meta.clone(),
                pattern_info: details.clone(),
            })
            .collect();
        ranked.push((source, rank(candidates)));
    }
    JobRepo::update_progress(pool, job_id, 30).await?;

    // 4. Interleave into one deduplicated candidate stream.
    let candidates: Vec<Candidate> =
        CandidateStream::with_default_proportions(ranked, params.seed).collect();

    // 5. Assign, skipping (annotator, entity) pairs already answered
    //    under any of the task's labels.
    let mut answered: HashMap<String, HashSet<String>> = HashMap::new();
    for (username, entity) in
        AnnotationRepo::annotated_pairs(pool, &task.entity_type, &labels).await?
    {
        answered.entry(username).or_default().insert(entity);
    }
    let assignments = assign(
        &candidates,
        &annotators,
        params.max_per_annotator,
        params.max_per_datapoint,
        |candidate: &Candidate, username: &str| {
            answered
                .get(username)
                .is_some_and(|entities| entities.contains(&candidate.entity))
        },
    );
    JobRepo::update_progress(pool, job_id, 40).await?;

    // 6. Swap each annotator's pending queue, one transaction per user.
    let total_users = assignments.len();
    let mut requests_created = 0usize;
    for (index, (username, queue)) in assignments.into_iter().enumerate() {
        let user = UserRepo::get_or_create(
            pool,
            &CreateUser {
                username: username.clone(),
                display_name: None,
            },
        )
        .await?;
        let requests = requests_for(&queue, &labels);
        let inserted =
            RequestRepo::swap_for_user(pool, task.id, user.id, &task.entity_type, &requests)
                .await?;
        requests_created += inserted;
        tracing::info!(
            task_id = task.id,
            username = %username,
            requests = inserted,
            "Queue swapped"
        );

        let progress = 40 + (50 * (index + 1) / total_users.max(1)) as i16;
        JobRepo::update_progress(pool, job_id, progress).await?;
    }

    Ok(serde_json::json!({
        "task_id": task.id,
        "annotators": total_users,
        "candidates": candidates.len(),
        "requests_created": requests_created,
        "skipped_lines": skipped,
        "not_scored": not_scored,
    }))
}

/// The scoring models configured for a label. Random always; Pattern
/// and Uncertainty only when their inputs exist.
async fn build_models(pool: &PgPool, label: &str) -> Result<Vec<ScoringModel>, JobError> {
    let mut models = vec![ScoringModel::Random];

    if let Some(row) = LabelPatternRepo::get(pool, label).await? {
        let phrases = row.phrases();
        if !phrases.is_empty() {
            tracing::debug!(label, phrases = phrases.len(), "Pattern model enabled");
            models.push(ScoringModel::Pattern(PatternModel::new(phrases)));
        }
    }

    if let Some(model) = ModelRepo::latest_for_label(pool, label).await? {
        let cache: HashMap<String, Vec<f64>> = ModelRepo::list_inferences(pool, model.id)
            .await?
            .into_iter()
            .filter_map(|inf| {
                serde_json::from_value(inf.probs)
                    .ok()
                    .map(|probs| (inf.text_sha256, probs))
            })
            .collect();
        if !cache.is_empty() {
            tracing::debug!(
                label,
                version = model.version,
                cached = cache.len(),
                "Uncertainty model enabled"
            );
            models.push(ScoringModel::Uncertainty(UncertaintyModel::new(cache)));
        }
    }

    Ok(models)
}

/// Fan one annotator's candidate queue out into request rows, one per
/// task label, labels adjacent per entity. The list arrives in rank
/// order and stays that way.
pub fn requests_for(queue: &[Candidate], labels: &[String]) -> Vec<NewRequest> {
    queue
        .iter()
        .flat_map(|candidate| {
            labels.iter().map(move |label| {
                let mut context = serde_json::json!({
                    "text": candidate.text,
                    "meta": candidate.meta,
                });
                if let Some(info) = &candidate.pattern_info {
                    context["pattern_info"] = info.clone();
                }
                NewRequest {
                    entity: candidate.entity.clone(),
                    label: label.clone(),
                    source: source_name(candidate.source).to_string(),
                    score: candidate.score,
                    context,
                }
            })
        })
        .collect()
}

fn source_name(source: ScoreSource) -> &'static str {
    match source {
        ScoreSource::Random => "random",
        ScoreSource::Pattern => "pattern",
        ScoreSource::Uncertainty => "uncertainty",
    }
}
