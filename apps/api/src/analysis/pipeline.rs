//! Eligibility analysis pipeline — orchestrates one synchronous run:
//! context assembly → prompt build → LLM invocation → parse/coerce →
//! one append-only INSERT.
//!
//! There is exactly one row written per run and it is never updated.
//! Re-analysis extends the free-text context and runs the whole pipeline
//! again, producing a brand-new row.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::analysis::context::{
    assemble_job_context, assemble_user_context, fetch_job, fetch_user, JobContext,
};
use crate::analysis::parser::{parse_analysis_response, CoercedAnalysis};
use crate::analysis::prompts::build_analysis_prompt;
use crate::errors::AppError;
use crate::llm_client::LlmGateway;
use crate::models::analysis::EligibilityAnalysisRow;
use crate::models::user::User;

/// Analyzes a user's eligibility for a stored job posting.
///
/// Input errors (unknown user/job, inactive job) surface before any LLM call.
/// Gateway failures propagate as `AppError::Upstream`. Malformed model output
/// is never an error — the parser substitutes the fallback record.
pub async fn analyze_eligibility(
    pool: &PgPool,
    llm: &dyn LlmGateway,
    user_id: Uuid,
    job_id: Uuid,
    additional_context: &str,
) -> Result<EligibilityAnalysisRow, AppError> {
    let user = fetch_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    let job = fetch_job(pool, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if job.status != "ACTIVE" {
        return Err(AppError::Validation(format!(
            "Job {job_id} is not active (status: {})",
            job.status
        )));
    }

    let job_context = assemble_job_context(pool, &job).await?;

    run_pipeline(pool, llm, &user, Some(job.id), &job_context, additional_context).await
}

/// Re-runs the analysis with additional context from the user.
///
/// The prior analysis must belong to the requesting user. Its context string
/// and the new context are concatenated append-only; the prior row itself is
/// never mutated.
pub async fn reanalyze(
    pool: &PgPool,
    llm: &dyn LlmGateway,
    analysis_id: Uuid,
    user_id: Uuid,
    additional_context: &str,
) -> Result<EligibilityAnalysisRow, AppError> {
    let prior = sqlx::query_as::<_, EligibilityAnalysisRow>(
        "SELECT * FROM job_eligibility_analyses WHERE id = $1 AND user_id = $2",
    )
    .bind(analysis_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        AppError::NotFound(
            "Analysis not found or you do not have permission to access it".to_string(),
        )
    })?;

    let job_id = prior.job_id.ok_or_else(|| {
        AppError::Validation(
            "This analysis was run against an unsaved dream job and cannot be re-analyzed; \
             run a new dream-job analysis instead"
                .to_string(),
        )
    })?;

    let combined = combine_context(&prior.additional_context, additional_context);

    analyze_eligibility(pool, llm, user_id, job_id, &combined).await
}

/// Runs the shared tail of the pipeline for an already-resolved user and job
/// context. `job_id` is None for dream-job analyses whose job was not saved.
pub async fn run_pipeline(
    pool: &PgPool,
    llm: &dyn LlmGateway,
    user: &User,
    job_id: Option<Uuid>,
    job_context: &JobContext,
    additional_context: &str,
) -> Result<EligibilityAnalysisRow, AppError> {
    let user_context = assemble_user_context(pool, user).await?;

    let prompt = build_analysis_prompt(&user_context, job_context, additional_context)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize contexts: {e}")))?;

    info!(
        "Running eligibility analysis for user {} against '{}'",
        user.id, job_context.title
    );

    let coerced = invoke_and_parse(llm, &prompt).await?;

    info!(
        "Analysis complete for user {}: {} ({}/100)",
        user.id, coerced.eligibility_level, coerced.match_score
    );

    let row = insert_analysis(
        pool,
        user.id,
        job_id,
        additional_context,
        &coerced,
        llm.model(),
    )
    .await?;

    Ok(row)
}

/// Invokes the gateway and coerces the response. Gateway failure is fatal to
/// the attempt; response shape never is.
pub(crate) async fn invoke_and_parse(
    llm: &dyn LlmGateway,
    prompt: &str,
) -> Result<CoercedAnalysis, AppError> {
    let raw = llm.invoke(prompt).await?;
    Ok(parse_analysis_response(&raw))
}

/// Appends the prior and new free-text context with a blank-line separator,
/// or returns the new context alone when the prior was empty.
pub fn combine_context(prior: &str, new: &str) -> String {
    if prior.is_empty() {
        new.to_string()
    } else {
        format!("{prior}\n\n{new}")
    }
}

/// Creates the analysis record in a single atomic INSERT. No UPDATE or
/// DELETE is ever issued against this table.
async fn insert_analysis(
    pool: &PgPool,
    user_id: Uuid,
    job_id: Option<Uuid>,
    additional_context: &str,
    c: &CoercedAnalysis,
    llm_model: &str,
) -> Result<EligibilityAnalysisRow, AppError> {
    let row = sqlx::query_as::<_, EligibilityAnalysisRow>(
        r#"
        INSERT INTO job_eligibility_analyses
            (id, user_id, job_id, additional_context,
             eligibility_level, match_score, analysis_summary,
             strengths, gaps, recommendations,
             matching_skills, missing_skills, skill_gaps,
             skills_match_score, experience_match_score, education_match_score,
             culture_fit_score, location_match_score, salary_match_score,
             technical_skills_score, soft_skills_score, domain_knowledge_score,
             experience_match, experience_gap_years,
             years_of_experience_required, years_of_experience_user,
             readiness_percentage, estimated_preparation_time, confidence_level,
             next_steps, priority_improvements, learning_resources,
             full_analysis, llm_model, token_usage)
        VALUES
            ($1, $2, $3, $4,
             $5, $6, $7,
             $8, $9, $10,
             $11, $12, $13,
             $14, $15, $16,
             $17, $18, $19,
             $20, $21, $22,
             $23, $24,
             $25, $26,
             $27, $28, $29,
             $30, $31, $32,
             $33, $34, $35)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(job_id)
    .bind(additional_context)
    .bind(&c.eligibility_level)
    .bind(c.match_score)
    .bind(&c.analysis_summary)
    .bind(serde_json::Value::Array(c.strengths.clone()))
    .bind(serde_json::Value::Array(c.gaps.clone()))
    .bind(serde_json::Value::Array(c.recommendations.clone()))
    .bind(serde_json::Value::Array(c.matching_skills.clone()))
    .bind(serde_json::Value::Array(c.missing_skills.clone()))
    .bind(serde_json::Value::Array(c.skill_gaps.clone()))
    .bind(c.skills_match_score)
    .bind(c.experience_match_score)
    .bind(c.education_match_score)
    .bind(c.culture_fit_score)
    .bind(c.location_match_score)
    .bind(c.salary_match_score)
    .bind(c.technical_skills_score)
    .bind(c.soft_skills_score)
    .bind(c.domain_knowledge_score)
    .bind(&c.experience_match)
    .bind(c.experience_gap_years)
    .bind(c.years_of_experience_required)
    .bind(c.years_of_experience_user)
    .bind(c.readiness_percentage)
    .bind(&c.estimated_preparation_time)
    .bind(&c.confidence_level)
    .bind(serde_json::Value::Array(c.next_steps.clone()))
    .bind(serde_json::Value::Array(c.priority_improvements.clone()))
    .bind(serde_json::Value::Array(c.learning_resources.clone()))
    .bind(&c.full_analysis)
    .bind(llm_model)
    .bind(c.token_usage)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use async_trait::async_trait;

    struct CannedLlm(Result<String, ()>);

    #[async_trait]
    impl LlmGateway for CannedLlm {
        async fn invoke(&self, _prompt: &str) -> Result<String, LlmError> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(LlmError::Api {
                    status: 401,
                    message: "Incorrect API key provided".to_string(),
                }),
            }
        }

        fn model(&self) -> &str {
            "gpt-4"
        }
    }

    #[test]
    fn test_combine_context_appends_with_separator() {
        assert_eq!(
            combine_context("Has 3 years Python", "Also knows Go"),
            "Has 3 years Python\n\nAlso knows Go"
        );
    }

    #[test]
    fn test_combine_context_empty_prior_uses_new_alone() {
        assert_eq!(combine_context("", "Also knows Go"), "Also knows Go");
    }

    #[tokio::test]
    async fn test_invoke_and_parse_tolerates_malformed_output() {
        let llm = CannedLlm(Ok("I cannot analyze this.".to_string()));
        let coerced = invoke_and_parse(&llm, "prompt").await.unwrap();
        assert_eq!(coerced.eligibility_level, "FAIR");
        assert_eq!(coerced.match_score, 50);
        assert_eq!(coerced.full_analysis, "I cannot analyze this.");
    }

    #[tokio::test]
    async fn test_invoke_and_parse_empty_response_yields_fallback_record() {
        // An empty completion is non-JSON text, not a gateway failure: it
        // must land on the fallback record instead of erroring out.
        let llm = CannedLlm(Ok(String::new()));
        let coerced = invoke_and_parse(&llm, "prompt").await.unwrap();
        assert_eq!(coerced.eligibility_level, "FAIR");
        assert_eq!(coerced.match_score, 50);
        assert_eq!(coerced.confidence_level, "MEDIUM");
        assert_eq!(coerced.full_analysis, "");
    }

    #[tokio::test]
    async fn test_invoke_and_parse_propagates_gateway_failure() {
        let llm = CannedLlm(Err(()));
        let err = invoke_and_parse(&llm, "prompt").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_invoke_and_parse_reads_fenced_json() {
        let llm = CannedLlm(Ok(
            "Sure! ```json\n{\"match_score\": 85, \"eligibility_level\": \"GOOD\"}\n```"
                .to_string(),
        ));
        let coerced = invoke_and_parse(&llm, "prompt").await.unwrap();
        assert_eq!(coerced.match_score, 85);
        assert_eq!(coerced.eligibility_level, "GOOD");
    }
}
