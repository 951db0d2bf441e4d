use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A job posting (scraped, user-submitted, or saved from a dream-job parse).
///
/// Status values: ACTIVE / CLOSED / FILLED / ON_HOLD. Only ACTIVE jobs are
/// browsable or analyzable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub company_name: String,
    pub company_description: String,
    pub description: String,
    pub responsibilities: String,
    pub requirements: String,
    pub nice_to_have: String,
    /// FULL_TIME / PART_TIME / CONTRACT / FREELANCE / INTERNSHIP
    pub job_type: String,
    /// ENTRY / JUNIOR / MID / SENIOR / LEAD / MANAGER / DIRECTOR / EXECUTIVE
    pub experience_level: String,
    pub location: String,
    pub is_remote: bool,
    /// REMOTE / HYBRID / ONSITE
    pub remote_policy: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: String,
    /// HOURLY / MONTHLY / YEARLY
    pub salary_period: String,
    /// Machine-parsed skills attached when the job came from a description parse.
    pub parsed_skills: Value,
    pub parsed_requirements: Value,
    pub source_url: Option<String>,
    pub source_platform: String,
    pub status: String,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A weighted skill requirement on a job, joined against the skills table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobSkillRequirementRow {
    pub id: Uuid,
    pub skill_name: String,
    /// MUST_HAVE / NICE_TO_HAVE / PREFERRED
    pub requirement_type: String,
    /// BEGINNER / INTERMEDIATE / ADVANCED / EXPERT
    pub minimum_proficiency: String,
    pub years_required: i32,
    /// Importance weight for matching.
    pub weight: i32,
}
