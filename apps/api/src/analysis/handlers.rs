//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

use crate::analysis::context::{build_job_context, fetch_user};
use crate::analysis::dream_job::{build_job_row, insert_dream_job, parse_job_description};
use crate::analysis::pipeline::{analyze_eligibility, reanalyze, run_pipeline};
use crate::errors::AppError;
use crate::models::analysis::EligibilityAnalysisRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub user_id: Uuid,
    pub job_id: Uuid,
    #[serde(default)]
    pub additional_context: String,
}

#[derive(Debug, Deserialize)]
pub struct ReanalyzeRequest {
    pub user_id: Uuid,
    pub analysis_id: Uuid,
    pub additional_context: String,
}

#[derive(Debug, Deserialize)]
pub struct DreamJobRequest {
    pub user_id: Uuid,
    pub job_description: String,
    #[serde(default)]
    pub additional_context: String,
    #[serde(default)]
    pub save_job: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserScope {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DreamJobResponse {
    pub message: String,
    pub parsed_job: Value,
    pub job_saved: bool,
    pub job_id: Option<Uuid>,
    pub analysis: EligibilityAnalysisRow,
}

#[derive(Debug, Serialize)]
pub struct AnalysisStatsResponse {
    pub total_analyses: i64,
    pub by_eligibility_level: EligibilityLevelCounts,
    pub average_match_score: f64,
    pub recent_analyses: Vec<EligibilityAnalysisRow>,
}

#[derive(Debug, Default, Serialize)]
pub struct EligibilityLevelCounts {
    #[serde(rename = "EXCELLENT")]
    pub excellent: i64,
    #[serde(rename = "GOOD")]
    pub good: i64,
    #[serde(rename = "FAIR")]
    pub fair: i64,
    #[serde(rename = "POOR")]
    pub poor: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyses/analyze
///
/// Runs the full eligibility pipeline for (user, job) and returns the new
/// immutable analysis record.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<EligibilityAnalysisRow>, AppError> {
    let analysis = analyze_eligibility(
        &state.db,
        state.llm.as_ref(),
        request.user_id,
        request.job_id,
        &request.additional_context,
    )
    .await?;

    Ok(Json(analysis))
}

/// POST /api/v1/analyses/reanalyze
///
/// Re-runs a prior analysis with extra context appended. Produces a new
/// record; the prior one is untouched.
pub async fn handle_reanalyze(
    State(state): State<AppState>,
    Json(request): Json<ReanalyzeRequest>,
) -> Result<Json<EligibilityAnalysisRow>, AppError> {
    if request.additional_context.trim().is_empty() {
        return Err(AppError::Validation(
            "additional_context cannot be empty".to_string(),
        ));
    }

    let analysis = reanalyze(
        &state.db,
        state.llm.as_ref(),
        request.analysis_id,
        request.user_id,
        &request.additional_context,
    )
    .await?;

    Ok(Json(analysis))
}

/// POST /api/v1/analyses/dream-job
///
/// Parses a pasted or described job, optionally saves it, then analyzes the
/// user's eligibility against it.
pub async fn handle_dream_job(
    State(state): State<AppState>,
    Json(request): Json<DreamJobRequest>,
) -> Result<Json<DreamJobResponse>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }

    let user = fetch_user(&state.db, request.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.user_id)))?;

    let parsed = parse_job_description(state.llm.as_ref(), &request.job_description).await?;

    let source_url = request
        .save_job
        .then(|| format!("https://skillsetz.com/dream-jobs/{}", Uuid::new_v4()));
    let job = build_job_row(&parsed, source_url);

    let job_id = if request.save_job {
        insert_dream_job(&state.db, &job).await?;
        Some(job.id)
    } else {
        None
    };

    let job_context = build_job_context(&job, &[]);
    let analysis = run_pipeline(
        &state.db,
        state.llm.as_ref(),
        &user,
        job_id,
        &job_context,
        &request.additional_context,
    )
    .await?;

    Ok(Json(DreamJobResponse {
        message: "Dream job analyzed successfully".to_string(),
        parsed_job: parsed,
        job_saved: request.save_job,
        job_id,
        analysis,
    }))
}

/// GET /api/v1/analyses?user_id=…
///
/// Returns the user's analyses, newest first.
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    Query(scope): Query<UserScope>,
) -> Result<Json<Vec<EligibilityAnalysisRow>>, AppError> {
    let analyses = sqlx::query_as::<_, EligibilityAnalysisRow>(
        "SELECT * FROM job_eligibility_analyses WHERE user_id = $1 ORDER BY analyzed_at DESC",
    )
    .bind(scope.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(analyses))
}

/// GET /api/v1/analyses/:id?user_id=…
///
/// Returns one analysis, scoped to the requesting user.
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
    Query(scope): Query<UserScope>,
) -> Result<Json<EligibilityAnalysisRow>, AppError> {
    let analysis = sqlx::query_as::<_, EligibilityAnalysisRow>(
        "SELECT * FROM job_eligibility_analyses WHERE id = $1 AND user_id = $2",
    )
    .bind(analysis_id)
    .bind(scope.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Analysis {analysis_id} not found")))?;

    Ok(Json(analysis))
}

/// GET /api/v1/analyses/stats?user_id=…
///
/// Aggregates over the user's analyses: totals, counts by eligibility level,
/// average match score (2 decimals), and the 5 most recent records.
pub async fn handle_analysis_stats(
    State(state): State<AppState>,
    Query(scope): Query<UserScope>,
) -> Result<Json<AnalysisStatsResponse>, AppError> {
    let level_rows = sqlx::query(
        r#"
        SELECT eligibility_level, COUNT(*) AS n
        FROM job_eligibility_analyses
        WHERE user_id = $1
        GROUP BY eligibility_level
        "#,
    )
    .bind(scope.user_id)
    .fetch_all(&state.db)
    .await?;

    let mut counts = EligibilityLevelCounts::default();
    let mut total = 0i64;
    for row in level_rows {
        let level: String = row.get("eligibility_level");
        let n: i64 = row.get("n");
        total += n;
        match level.as_str() {
            "EXCELLENT" => counts.excellent = n,
            "GOOD" => counts.good = n,
            "FAIR" => counts.fair = n,
            "POOR" => counts.poor = n,
            _ => {}
        }
    }

    let average: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(match_score)::float8 FROM job_eligibility_analyses WHERE user_id = $1",
    )
    .bind(scope.user_id)
    .fetch_one(&state.db)
    .await?;

    let recent = sqlx::query_as::<_, EligibilityAnalysisRow>(
        r#"
        SELECT * FROM job_eligibility_analyses
        WHERE user_id = $1
        ORDER BY analyzed_at DESC
        LIMIT 5
        "#,
    )
    .bind(scope.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(AnalysisStatsResponse {
        total_analyses: total,
        by_eligibility_level: counts,
        average_match_score: round2(average.unwrap_or(0.0)),
        recent_analyses: recent,
    }))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.66666), 66.67);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(50.0), 50.0);
    }

    #[test]
    fn test_analyze_request_additional_context_defaults_empty() {
        let json = serde_json::json!({
            "user_id": Uuid::new_v4(),
            "job_id": Uuid::new_v4()
        });
        let request: AnalyzeRequest = serde_json::from_value(json).unwrap();
        assert!(request.additional_context.is_empty());
    }

    #[test]
    fn test_dream_job_request_save_defaults_false() {
        let json = serde_json::json!({
            "user_id": Uuid::new_v4(),
            "job_description": "Senior Rust Engineer at a fintech startup"
        });
        let request: DreamJobRequest = serde_json::from_value(json).unwrap();
        assert!(!request.save_job);
        assert!(request.additional_context.is_empty());
    }

    #[test]
    fn test_eligibility_level_counts_serialize_upper_case() {
        let counts = EligibilityLevelCounts {
            excellent: 1,
            good: 2,
            fair: 3,
            poor: 4,
        };
        let value = serde_json::to_value(&counts).unwrap();
        assert_eq!(value["EXCELLENT"], 1);
        assert_eq!(value["POOR"], 4);
    }
}
