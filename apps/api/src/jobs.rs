//! Axum route handlers for browsing job postings.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::context::fetch_skill_requirements;
use crate::errors::AppError;
use crate::models::job::{JobRow, JobSkillRequirementRow};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    pub job: JobRow,
    pub skill_requirements: Vec<JobSkillRequirementRow>,
}

// Only ACTIVE jobs are browsable; CLOSED/FILLED/ON_HOLD postings 404 on
// retrieve and never get their view counter bumped.
const LIST_JOBS_QUERY: &str = "SELECT * FROM jobs WHERE status = 'ACTIVE' ORDER BY created_at DESC";
const GET_JOB_QUERY: &str =
    "UPDATE jobs SET view_count = view_count + 1 WHERE id = $1 AND status = 'ACTIVE' RETURNING *";

/// GET /api/v1/jobs
///
/// Lists active jobs, newest first.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let jobs = sqlx::query_as::<_, JobRow>(LIST_JOBS_QUERY)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id
///
/// Returns the active job with its skill requirements and bumps the view
/// counter. Non-active jobs are indistinguishable from missing ones.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobDetailResponse>, AppError> {
    let job = sqlx::query_as::<_, JobRow>(GET_JOB_QUERY)
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let skill_requirements = fetch_skill_requirements(&state.db, job_id).await?;

    Ok(Json(JobDetailResponse {
        job,
        skill_requirements,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_queries_are_scoped_to_active_rows() {
        assert!(LIST_JOBS_QUERY.contains("status = 'ACTIVE'"));
        assert!(GET_JOB_QUERY.contains("AND status = 'ACTIVE'"));
    }
}
