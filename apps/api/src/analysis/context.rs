//! Context Assembler — gathers a user's profile data and a job's posting data
//! into the two plain nested structures the Prompt Builder serializes.
//!
//! Every related record is probed through its own optional lookup and degrades
//! to an empty/default sub-structure on absence: analysis must be possible
//! even for a sparsely-filled profile. No lookup may fail the whole assembly
//! just because optional data is missing. List ordering is storage (insertion)
//! order as returned by the queries; the assembler never re-sorts.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::job::{JobRow, JobSkillRequirementRow};
use crate::models::profile::{
    CertificationRow, EducationRow, UserPreferencesRow, UserProfileRow, UserSkillRow,
    WorkExperienceRow,
};
use crate::models::user::User;

// ────────────────────────────────────────────────────────────────────────────
// Context structures (ephemeral — built per analysis, never stored)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileContext {
    pub bio: String,
    pub current_title: String,
    pub current_company: String,
    pub years_of_experience: f64,
    pub career_goal: String,
    pub target_roles: Value,
    pub industry: String,
    pub domain_expertise: Value,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreferencesContext {
    pub preferred_job_types: Value,
    pub preferred_locations: Value,
    pub remote_preference: String,
    pub salary_expectation_min: Option<i32>,
    pub salary_expectation_max: Option<i32>,
    pub willing_to_relocate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillContext {
    pub name: String,
    pub proficiency_level: String,
    pub years_of_experience: f64,
    pub is_verified: bool,
    pub verified_by: Option<String>,
    pub last_used: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkExperienceContext {
    pub job_title: String,
    pub company: String,
    pub employment_type: String,
    pub location: String,
    pub is_remote: bool,
    pub start_date: String,
    /// ISO date, or "Present" for a current role.
    pub end_date: String,
    pub is_current: bool,
    pub description: String,
    pub responsibilities: Value,
    pub achievements: Value,
    pub skills_used: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct EducationContext {
    pub institution: String,
    pub degree: String,
    pub degree_level: String,
    pub field_of_study: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertificationContext {
    pub name: String,
    pub issuing_organization: String,
    pub issue_date: String,
    pub skills_validated: Value,
}

/// Everything the prompt needs to know about the candidate.
#[derive(Debug, Clone, Serialize)]
pub struct UserContext {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile: ProfileContext,
    pub job_preferences: PreferencesContext,
    pub skills: Vec<SkillContext>,
    pub work_experience: Vec<WorkExperienceContext>,
    pub education: Vec<EducationContext>,
    pub certifications: Vec<CertificationContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillRequirementContext {
    pub skill_name: String,
    pub requirement_type: String,
    pub minimum_proficiency: String,
    pub years_required: i32,
    pub weight: i32,
}

/// Everything the prompt needs to know about the job posting.
#[derive(Debug, Clone, Serialize)]
pub struct JobContext {
    pub title: String,
    pub company_name: String,
    pub company_description: String,
    pub description: String,
    pub responsibilities: String,
    pub requirements: String,
    pub nice_to_have: String,
    pub job_type: String,
    pub experience_level: String,
    pub location: String,
    pub is_remote: bool,
    pub remote_policy: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: String,
    pub salary_period: String,
    pub required_skills: Vec<SkillRequirementContext>,
    pub parsed_skills: Value,
    pub parsed_requirements: Value,
}

// ────────────────────────────────────────────────────────────────────────────
// Lookups
// ────────────────────────────────────────────────────────────────────────────

pub async fn fetch_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_job(pool: &PgPool, job_id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

async fn fetch_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<UserProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, UserProfileRow>("SELECT * FROM user_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

async fn fetch_preferences(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserPreferencesRow>, sqlx::Error> {
    sqlx::query_as::<_, UserPreferencesRow>("SELECT * FROM user_preferences WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

async fn fetch_skills(pool: &PgPool, user_id: Uuid) -> Result<Vec<UserSkillRow>, sqlx::Error> {
    sqlx::query_as::<_, UserSkillRow>(
        r#"
        SELECT us.id, s.name AS skill_name, us.proficiency_level,
               us.years_of_experience, us.is_verified, us.verified_by, us.last_used
        FROM user_skills us
        JOIN skills s ON s.id = us.skill_id
        JOIN user_profiles p ON p.id = us.profile_id
        WHERE p.user_id = $1
        ORDER BY us.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

async fn fetch_work_experience(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<WorkExperienceRow>, sqlx::Error> {
    sqlx::query_as::<_, WorkExperienceRow>(
        r#"
        SELECT w.id, w.job_title, w.company, w.employment_type, w.location,
               w.is_remote, w.start_date, w.end_date, w.is_current, w.description,
               w.responsibilities, w.achievements, w.skills_used
        FROM work_experiences w
        JOIN user_profiles p ON p.id = w.profile_id
        WHERE p.user_id = $1
        ORDER BY w.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

async fn fetch_education(pool: &PgPool, user_id: Uuid) -> Result<Vec<EducationRow>, sqlx::Error> {
    sqlx::query_as::<_, EducationRow>(
        r#"
        SELECT e.id, e.institution, e.degree, e.degree_level, e.field_of_study,
               e.start_date, e.end_date, e.is_current
        FROM educations e
        JOIN user_profiles p ON p.id = e.profile_id
        WHERE p.user_id = $1
        ORDER BY e.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

async fn fetch_certifications(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<CertificationRow>, sqlx::Error> {
    sqlx::query_as::<_, CertificationRow>(
        r#"
        SELECT c.id, c.name, c.issuing_organization, c.issue_date, c.skills_validated
        FROM certifications c
        JOIN user_profiles p ON p.id = c.profile_id
        WHERE p.user_id = $1
        ORDER BY c.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_skill_requirements(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Vec<JobSkillRequirementRow>, sqlx::Error> {
    sqlx::query_as::<_, JobSkillRequirementRow>(
        r#"
        SELECT r.id, s.name AS skill_name, r.requirement_type,
               r.minimum_proficiency, r.years_required, r.weight
        FROM job_skill_requirements r
        JOIN skills s ON s.id = r.skill_id
        WHERE r.job_id = $1
        ORDER BY r.created_at
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Assembly
// ────────────────────────────────────────────────────────────────────────────

/// Builds the full candidate context for one analysis call.
pub async fn assemble_user_context(pool: &PgPool, user: &User) -> Result<UserContext, sqlx::Error> {
    let profile = fetch_profile(pool, user.id).await?;
    let preferences = fetch_preferences(pool, user.id).await?;
    let skills = fetch_skills(pool, user.id).await?;
    let work = fetch_work_experience(pool, user.id).await?;
    let education = fetch_education(pool, user.id).await?;
    let certifications = fetch_certifications(pool, user.id).await?;

    Ok(build_user_context(
        user,
        profile.as_ref(),
        preferences.as_ref(),
        &skills,
        &work,
        &education,
        &certifications,
    ))
}

/// Builds the job context for one analysis call.
pub async fn assemble_job_context(pool: &PgPool, job: &JobRow) -> Result<JobContext, sqlx::Error> {
    let requirements = fetch_skill_requirements(pool, job.id).await?;
    Ok(build_job_context(job, &requirements))
}

/// Pure assembly from already-fetched rows.
pub fn build_user_context(
    user: &User,
    profile: Option<&UserProfileRow>,
    preferences: Option<&UserPreferencesRow>,
    skills: &[UserSkillRow],
    work: &[WorkExperienceRow],
    education: &[EducationRow],
    certifications: &[CertificationRow],
) -> UserContext {
    UserContext {
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        profile: profile.map(profile_context).unwrap_or_default(),
        job_preferences: preferences.map(preferences_context).unwrap_or_default(),
        skills: skills.iter().map(skill_context).collect(),
        work_experience: work.iter().map(work_context).collect(),
        education: education.iter().map(education_context).collect(),
        certifications: certifications.iter().map(certification_context).collect(),
    }
}

/// Pure assembly from a job row and its skill requirements. Also used for
/// dream-job analyses where the parsed job was never persisted.
pub fn build_job_context(job: &JobRow, requirements: &[JobSkillRequirementRow]) -> JobContext {
    JobContext {
        title: job.title.clone(),
        company_name: job.company_name.clone(),
        company_description: job.company_description.clone(),
        description: job.description.clone(),
        responsibilities: job.responsibilities.clone(),
        requirements: job.requirements.clone(),
        nice_to_have: job.nice_to_have.clone(),
        job_type: job.job_type.clone(),
        experience_level: job.experience_level.clone(),
        location: job.location.clone(),
        is_remote: job.is_remote,
        remote_policy: job.remote_policy.clone(),
        salary_min: job.salary_min,
        salary_max: job.salary_max,
        salary_currency: job.salary_currency.clone(),
        salary_period: job.salary_period.clone(),
        required_skills: requirements
            .iter()
            .map(|r| SkillRequirementContext {
                skill_name: r.skill_name.clone(),
                requirement_type: r.requirement_type.clone(),
                minimum_proficiency: r.minimum_proficiency.clone(),
                years_required: r.years_required,
                weight: r.weight,
            })
            .collect(),
        parsed_skills: job.parsed_skills.clone(),
        parsed_requirements: job.parsed_requirements.clone(),
    }
}

fn profile_context(p: &UserProfileRow) -> ProfileContext {
    ProfileContext {
        bio: p.bio.clone(),
        current_title: p.current_title.clone(),
        current_company: p.current_company.clone(),
        years_of_experience: p.years_of_experience,
        career_goal: p.career_goal.clone(),
        target_roles: p.target_roles.clone(),
        industry: p.industry.clone(),
        domain_expertise: p.domain_expertise.clone(),
    }
}

fn preferences_context(p: &UserPreferencesRow) -> PreferencesContext {
    PreferencesContext {
        preferred_job_types: p.preferred_job_types.clone(),
        preferred_locations: p.preferred_locations.clone(),
        remote_preference: p.remote_preference.clone(),
        salary_expectation_min: p.salary_expectation_min,
        salary_expectation_max: p.salary_expectation_max,
        willing_to_relocate: p.willing_to_relocate,
    }
}

fn skill_context(s: &UserSkillRow) -> SkillContext {
    SkillContext {
        name: s.skill_name.clone(),
        proficiency_level: s.proficiency_level.clone(),
        years_of_experience: s.years_of_experience.unwrap_or(0.0),
        is_verified: s.is_verified,
        verified_by: s.verified_by.clone(),
        last_used: s.last_used.map(|d| d.to_string()),
    }
}

fn work_context(w: &WorkExperienceRow) -> WorkExperienceContext {
    WorkExperienceContext {
        job_title: w.job_title.clone(),
        company: w.company.clone(),
        employment_type: w.employment_type.clone(),
        location: w.location.clone(),
        is_remote: w.is_remote,
        start_date: w.start_date.to_string(),
        end_date: end_date_or_present(w.end_date),
        is_current: w.is_current,
        description: w.description.clone(),
        responsibilities: w.responsibilities.clone(),
        achievements: w.achievements.clone(),
        skills_used: w.skills_used.clone(),
    }
}

fn education_context(e: &EducationRow) -> EducationContext {
    EducationContext {
        institution: e.institution.clone(),
        degree: e.degree.clone(),
        degree_level: e.degree_level.clone(),
        field_of_study: e.field_of_study.clone(),
        start_date: e.start_date.to_string(),
        end_date: end_date_or_present(e.end_date),
        is_current: e.is_current,
    }
}

fn certification_context(c: &CertificationRow) -> CertificationContext {
    CertificationContext {
        name: c.name.clone(),
        issuing_organization: c.issuing_organization.clone(),
        issue_date: c.issue_date.to_string(),
        skills_validated: c.skills_validated.clone(),
    }
}

fn end_date_or_present(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| "Present".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sparse_profile_degrades_to_defaults() {
        let user = test_user();
        let ctx = build_user_context(&user, None, None, &[], &[], &[], &[]);

        assert_eq!(ctx.email, "dev@example.com");
        assert_eq!(ctx.profile.bio, "");
        assert_eq!(ctx.profile.years_of_experience, 0.0);
        assert!(ctx.skills.is_empty());
        assert!(ctx.work_experience.is_empty());
        assert!(ctx.education.is_empty());
        assert!(ctx.certifications.is_empty());
    }

    #[test]
    fn test_current_work_experience_renders_present() {
        let user = test_user();
        let work = vec![WorkExperienceRow {
            id: Uuid::new_v4(),
            job_title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            employment_type: "FULL_TIME".to_string(),
            location: "Berlin".to_string(),
            is_remote: true,
            start_date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            end_date: None,
            is_current: true,
            description: String::new(),
            responsibilities: json!(["Built APIs"]),
            achievements: json!([]),
            skills_used: json!(["Rust", "Postgres"]),
        }];
        let ctx = build_user_context(&user, None, None, &[], &work, &[], &[]);

        assert_eq!(ctx.work_experience[0].end_date, "Present");
        assert_eq!(ctx.work_experience[0].start_date, "2021-03-01");
    }

    #[test]
    fn test_list_ordering_is_preserved_not_resorted() {
        let user = test_user();
        let mk = |name: &str| UserSkillRow {
            id: Uuid::new_v4(),
            skill_name: name.to_string(),
            proficiency_level: "ADVANCED".to_string(),
            years_of_experience: Some(3.0),
            is_verified: false,
            verified_by: None,
            last_used: None,
        };
        let skills = vec![mk("Zig"), mk("Ada"), mk("Rust")];
        let ctx = build_user_context(&user, None, None, &skills, &[], &[], &[]);

        let names: Vec<_> = ctx.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Zig", "Ada", "Rust"]);
    }

    #[test]
    fn test_user_context_serialization_is_deterministic() {
        let user = test_user();
        let ctx = build_user_context(&user, None, None, &[], &[], &[], &[]);
        let a = serde_json::to_string_pretty(&ctx).unwrap();
        let b = serde_json::to_string_pretty(&ctx).unwrap();
        assert_eq!(a, b);
    }
}
