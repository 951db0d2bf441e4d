//! Profile-side row types: the optional related records the Context Assembler
//! probes when building a `UserContext`. Every one of these may legitimately
//! be absent for a sparsely-filled profile.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: String,
    pub current_title: String,
    pub current_company: String,
    pub years_of_experience: f64,
    pub career_goal: String,
    pub target_roles: Value,
    pub industry: String,
    pub domain_expertise: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPreferencesRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub preferred_job_types: Value,
    pub preferred_locations: Value,
    pub remote_preference: String,
    pub salary_expectation_min: Option<i32>,
    pub salary_expectation_max: Option<i32>,
    pub willing_to_relocate: bool,
}

/// One user skill, joined against the skills table (`skill_name`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSkillRow {
    pub id: Uuid,
    pub skill_name: String,
    /// BEGINNER / INTERMEDIATE / ADVANCED / EXPERT
    pub proficiency_level: String,
    pub years_of_experience: Option<f64>,
    pub is_verified: bool,
    pub verified_by: Option<String>,
    pub last_used: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkExperienceRow {
    pub id: Uuid,
    pub job_title: String,
    pub company: String,
    pub employment_type: String,
    pub location: String,
    pub is_remote: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: String,
    pub responsibilities: Value,
    pub achievements: Value,
    /// JSONB array of skill names used in this role.
    pub skills_used: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EducationRow {
    pub id: Uuid,
    pub institution: String,
    pub degree: String,
    /// HIGH_SCHOOL / ASSOCIATE / BACHELOR / MASTER / PHD
    pub degree_level: String,
    pub field_of_study: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CertificationRow {
    pub id: Uuid,
    pub name: String,
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    /// JSONB array of skill names this certification validates.
    pub skills_validated: Value,
}
