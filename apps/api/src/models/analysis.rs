//! The persisted eligibility-analysis record.
//!
//! Append-only: a row is written exactly once per pipeline run and never
//! updated or deleted. Re-analysis writes a new row. Multiple analyses per
//! (user, job) pair are permitted by design.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Allowed confidence values. Anything else coerces to MEDIUM.
pub const VALID_CONFIDENCE_LEVELS: [&str; 5] =
    ["VERY_HIGH", "HIGH", "MEDIUM", "LOW", "VERY_LOW"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EligibilityAnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    /// NULL for dream-job analyses where the parsed job was not saved.
    pub job_id: Option<Uuid>,
    /// Append-only across re-analyses: prior context + "\n\n" + new context.
    pub additional_context: String,

    // Core verdict
    /// EXCELLENT / GOOD / FAIR / POOR
    pub eligibility_level: String,
    /// Overall match score (0-100).
    pub match_score: i32,

    // Explanatory fields (list columns are JSONB arrays, never NULL)
    pub analysis_summary: String,
    pub strengths: Value,
    pub gaps: Value,
    pub recommendations: Value,
    pub matching_skills: Value,
    pub missing_skills: Value,
    /// Structured records: skill_name, required_level, current_level,
    /// gap_severity, priority, estimated_time_to_learn.
    pub skill_gaps: Value,

    // Detailed match metrics (0-100, default 0)
    pub skills_match_score: i32,
    pub experience_match_score: i32,
    pub education_match_score: i32,
    pub culture_fit_score: i32,
    pub location_match_score: i32,
    pub salary_match_score: i32,

    // Categorized scores (0-100, default 0)
    pub technical_skills_score: i32,
    pub soft_skills_score: i32,
    pub domain_knowledge_score: i32,

    // Experience analysis
    pub experience_match: String,
    pub experience_gap_years: Option<f64>,
    pub years_of_experience_required: Option<f64>,
    pub years_of_experience_user: Option<f64>,

    // Readiness
    pub readiness_percentage: i32,
    pub estimated_preparation_time: String,
    /// Always one of `VALID_CONFIDENCE_LEVELS`.
    pub confidence_level: String,

    // Actionability
    pub next_steps: Value,
    /// Records: area, current_state, target_state, impact, effort, timeline.
    pub priority_improvements: Value,
    /// Records: resource_type, title, description, estimated_duration, priority.
    pub learning_resources: Value,

    // Metadata
    /// Raw LLM response text, preserved verbatim for audit.
    pub full_analysis: String,
    pub llm_model: String,
    /// Constant 0 — token accounting is not instrumented.
    pub token_usage: i32,
    pub analyzed_at: DateTime<Utc>,
}
