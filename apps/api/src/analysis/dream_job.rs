//! Dream-job analysis — parses a pasted or free-text job description into a
//! structured job, then runs the standard eligibility pipeline against it.
//!
//! Unlike the eligibility parser, this parse is STRICT: the model is asked to
//! extract a known schema, and output that is not valid JSON is a caller
//! error (400), not a fallback. Code fences around the JSON are tolerated.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmGateway;
use crate::models::job::JobRow;

/// Dream-job parse prompt. Replace: {job_description}
pub const DREAM_JOB_PARSE_PROMPT: &str = r#"You are an expert job description analyzer. Extract structured information from job postings.

Your task is to analyze the job description and extract the following information in JSON format:

{
  "job_title": "Job title",
  "company_name": "Company name (or 'Not Specified' if user described dream job)",
  "job_type": "FULL_TIME/PART_TIME/CONTRACT/FREELANCE",
  "experience_level": "ENTRY/JUNIOR/MID/SENIOR/LEAD/EXECUTIVE",
  "location": "City, State/Country",
  "is_remote": true or false,
  "remote_policy": "FULLY_REMOTE/HYBRID/ON_SITE",
  "description": "Brief job description/summary",
  "responsibilities": ["Responsibility 1", "Responsibility 2"],
  "required_skills": [
    {
      "name": "Skill name",
      "requirement_type": "MUST_HAVE",
      "minimum_proficiency": "BEGINNER/INTERMEDIATE/ADVANCED/EXPERT",
      "years_required": 3 or null
    }
  ],
  "preferred_skills": [
    {
      "name": "Skill name",
      "requirement_type": "NICE_TO_HAVE",
      "minimum_proficiency": "BEGINNER/INTERMEDIATE/ADVANCED/EXPERT"
    }
  ],
  "education_requirements": {
    "degree_level": "HIGH_SCHOOL/ASSOCIATE/BACHELOR/MASTER/PHD",
    "field_of_study": "Preferred field (or null)",
    "is_required": true or false
  },
  "min_years_experience": 2 or null,
  "max_years_experience": 5 or null,
  "min_salary": 90000 or null,
  "max_salary": 120000 or null,
  "salary_currency": "USD/EUR/GBP etc.",
  "benefits": ["Benefit 1", "Benefit 2"],
  "company_culture": "Description of culture/values",
  "industry": "Industry sector"
}

IMPORTANT RULES:
1. Extract ALL available information, even if incomplete
2. For missing fields, use null or empty arrays
3. Categorize skills into MUST_HAVE (required) vs NICE_TO_HAVE (preferred)
4. Infer minimum proficiency from context (e.g., "5+ years Python" = ADVANCED)
5. Extract years of experience requirements for specific skills when mentioned
6. Standardize skill names (e.g., "JavaScript" not "javascript")
7. If user describes a dream job without specifics, infer reasonable requirements
8. For salary, extract ranges when provided
9. Return ONLY valid JSON, no additional text

If information is ambiguous or missing, make reasonable inferences based on context and industry standards.

Job description:

{job_description}"#;

/// Parses a job description with the LLM and returns the structured object.
/// Strict: non-JSON output is a validation error, never a fallback.
pub async fn parse_job_description(
    llm: &dyn LlmGateway,
    job_description: &str,
) -> Result<Value, AppError> {
    let prompt = DREAM_JOB_PARSE_PROMPT.replace("{job_description}", job_description);
    let raw = llm.invoke(&prompt).await?;

    let content = strip_json_fences(&raw);
    let parsed: Value = serde_json::from_str(content).map_err(|e| {
        AppError::Validation(format!("Failed to parse LLM response as JSON: {e}"))
    })?;
    if !parsed.is_object() {
        return Err(AppError::Validation(
            "LLM response was valid JSON but not an object".to_string(),
        ));
    }
    Ok(parsed)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Maps the prompt's remote-policy vocabulary onto the stored one.
/// FULLY_REMOTE -> REMOTE, ON_SITE -> ONSITE; everything else passes through.
pub fn normalize_remote_policy(policy: &str) -> String {
    match policy {
        "FULLY_REMOTE" => "REMOTE".to_string(),
        "ON_SITE" => "ONSITE".to_string(),
        other => other.to_string(),
    }
}

/// Builds a `JobRow` from parsed dream-job data.
///
/// `source_url` is set only for jobs being saved; a temporary job for a
/// one-off analysis carries no source URL and is never inserted.
pub fn build_job_row(parsed: &Value, source_url: Option<String>) -> JobRow {
    let str_or = |key: &str, default: &str| -> String {
        parsed
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string())
    };

    let remote_policy = normalize_remote_policy(&str_or("remote_policy", "REMOTE"));

    let responsibilities = match parsed.get("responsibilities") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|r| format!("• {}", r.as_str().map(str::to_string).unwrap_or_else(|| r.to_string())))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };

    let required_skills = list_of(parsed, "required_skills");
    let preferred_skills = list_of(parsed, "preferred_skills");

    let requirements = required_skills
        .iter()
        .map(|req| format!("• {}", skill_name(req)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut parsed_skills = required_skills;
    parsed_skills.extend(preferred_skills);

    JobRow {
        id: Uuid::new_v4(),
        title: str_or("job_title", "Unknown Title"),
        company_name: str_or("company_name", "Dream Company"),
        company_description: str_or("company_culture", ""),
        description: str_or("description", ""),
        responsibilities,
        requirements,
        nice_to_have: String::new(),
        job_type: str_or("job_type", "FULL_TIME"),
        experience_level: str_or("experience_level", "MID"),
        location: str_or("location", "Remote"),
        is_remote: parsed
            .get("is_remote")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        remote_policy,
        salary_min: parsed
            .get("min_salary")
            .and_then(Value::as_i64)
            .map(|v| v as i32),
        salary_max: parsed
            .get("max_salary")
            .and_then(Value::as_i64)
            .map(|v| v as i32),
        salary_currency: str_or("salary_currency", "USD"),
        salary_period: "YEARLY".to_string(),
        parsed_skills: Value::Array(parsed_skills),
        parsed_requirements: parsed.clone(),
        source_url,
        source_platform: "Dream Job (User Created)".to_string(),
        status: "ACTIVE".to_string(),
        view_count: 0,
        created_at: Utc::now(),
    }
}

/// Persists a dream job parsed from a description.
pub async fn insert_dream_job(pool: &sqlx::PgPool, job: &JobRow) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO jobs
            (id, title, company_name, company_description, description,
             responsibilities, requirements, nice_to_have, job_type,
             experience_level, location, is_remote, remote_policy,
             salary_min, salary_max, salary_currency, salary_period,
             parsed_skills, parsed_requirements, source_url, source_platform,
             status, view_count)
        VALUES
            ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
             $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
        "#,
    )
    .bind(job.id)
    .bind(&job.title)
    .bind(&job.company_name)
    .bind(&job.company_description)
    .bind(&job.description)
    .bind(&job.responsibilities)
    .bind(&job.requirements)
    .bind(&job.nice_to_have)
    .bind(&job.job_type)
    .bind(&job.experience_level)
    .bind(&job.location)
    .bind(job.is_remote)
    .bind(&job.remote_policy)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(&job.salary_currency)
    .bind(&job.salary_period)
    .bind(&job.parsed_skills)
    .bind(&job.parsed_requirements)
    .bind(&job.source_url)
    .bind(&job.source_platform)
    .bind(&job.status)
    .bind(job.view_count)
    .execute(pool)
    .await?;

    Ok(())
}

fn list_of(parsed: &Value, key: &str) -> Vec<Value> {
    parsed
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// A parsed skill may be an object with a `name` or a bare string.
fn skill_name(req: &Value) -> String {
    req.get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| match req {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_remote_policy_mapping() {
        assert_eq!(normalize_remote_policy("FULLY_REMOTE"), "REMOTE");
        assert_eq!(normalize_remote_policy("ON_SITE"), "ONSITE");
        assert_eq!(normalize_remote_policy("HYBRID"), "HYBRID");
        assert_eq!(normalize_remote_policy("REMOTE"), "REMOTE");
    }

    #[test]
    fn test_strip_json_fences_variants() {
        assert_eq!(
            strip_json_fences("```json\n{\"a\": 1}\n```"),
            "{\"a\": 1}"
        );
        assert_eq!(strip_json_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_json_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_build_job_row_defaults_and_skills() {
        let parsed = json!({
            "job_title": "Staff Engineer",
            "remote_policy": "FULLY_REMOTE",
            "responsibilities": ["Design systems", "Mentor engineers"],
            "required_skills": [
                {"name": "Rust", "requirement_type": "MUST_HAVE"},
                "Postgres"
            ],
            "preferred_skills": [{"name": "Kubernetes", "requirement_type": "NICE_TO_HAVE"}],
            "min_salary": 150000
        });
        let job = build_job_row(&parsed, None);

        assert_eq!(job.title, "Staff Engineer");
        assert_eq!(job.company_name, "Dream Company");
        assert_eq!(job.remote_policy, "REMOTE");
        assert_eq!(job.responsibilities, "• Design systems\n• Mentor engineers");
        assert_eq!(job.requirements, "• Rust\n• Postgres");
        assert_eq!(job.salary_min, Some(150000));
        assert_eq!(job.salary_max, None);
        assert_eq!(job.parsed_skills.as_array().unwrap().len(), 3);
        assert_eq!(job.status, "ACTIVE");
        assert!(job.source_url.is_none());
    }

    #[test]
    fn test_build_job_row_tolerates_empty_parse() {
        let parsed = json!({});
        let job = build_job_row(&parsed, Some("https://example.com/dream/1".to_string()));

        assert_eq!(job.title, "Unknown Title");
        assert_eq!(job.job_type, "FULL_TIME");
        assert_eq!(job.experience_level, "MID");
        assert_eq!(job.location, "Remote");
        assert!(job.is_remote);
        assert!(job.requirements.is_empty());
        assert_eq!(job.source_url.as_deref(), Some("https://example.com/dream/1"));
    }
}
