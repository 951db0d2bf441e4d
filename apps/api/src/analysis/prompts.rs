//! Prompt constants and the deterministic prompt builder for eligibility
//! analysis. The JSON schema embedded in `ANALYSIS_PROMPT_TEMPLATE` is the
//! contract with the response parser: every field named here is a field the
//! coercion step expects, with the same allowed value domain.

use super::context::{JobContext, UserContext};

/// Eligibility analysis prompt template.
/// Replace: {user_context}, {job_context}, {additional_section}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an expert career counselor and recruiter analyzing whether a candidate is eligible for a job position.

**CANDIDATE PROFILE:**
{user_context}

**JOB POSTING:**
{job_context}
{additional_section}

**YOUR TASK:**
Analyze the candidate's eligibility for this job position. Consider:
1. Skills match (technical and soft skills)
2. Experience level and years of experience
3. Education and certifications
4. Work history and achievements
5. Career trajectory and goals
6. Location and remote work preferences
7. Salary expectations vs. job offer
8. Culture fit and soft skills
9. Domain knowledge and industry expertise
10. Overall readiness and preparation needed

Provide a comprehensive, multi-dimensional analysis with detailed metrics across all dimensions.

Be honest but constructive. If there are significant gaps, explain them clearly but also provide actionable guidance on how to bridge them.

**IMPORTANT: Return your response as a valid JSON object with the following structure:**
{
    "eligibility_level": "EXCELLENT/GOOD/FAIR/POOR",
    "match_score": 0-100,
    "analysis_summary": "2-3 sentence summary",
    "strengths": ["strength 1", "strength 2", ...],
    "gaps": ["gap 1", "gap 2", ...],
    "recommendations": ["recommendation 1", "recommendation 2", ...],
    "matching_skills": ["skill 1", "skill 2", ...],
    "missing_skills": ["skill 1", "skill 2", ...],
    "skill_gaps": [
        {
            "skill_name": "Skill name",
            "required_level": "BEGINNER/INTERMEDIATE/ADVANCED/EXPERT",
            "current_level": "BEGINNER/INTERMEDIATE/ADVANCED/EXPERT",
            "gap_severity": "LOW/MEDIUM/HIGH/CRITICAL",
            "priority": "LOW/MEDIUM/HIGH/CRITICAL",
            "estimated_time_to_learn": "e.g., 2-3 months"
        }
    ],
    "skills_match_score": 0-100,
    "experience_match_score": 0-100,
    "education_match_score": 0-100,
    "culture_fit_score": 0-100,
    "location_match_score": 0-100,
    "salary_match_score": 0-100,
    "technical_skills_score": 0-100,
    "soft_skills_score": 0-100,
    "domain_knowledge_score": 0-100,
    "experience_match": "Explanation of how experience matches",
    "experience_gap_years": 0.0 or null,
    "years_of_experience_required": 0.0 or null,
    "years_of_experience_user": 0.0 or null,
    "readiness_percentage": 0-100,
    "estimated_preparation_time": "e.g., 3-6 months, or 'Ready now'",
    "confidence_level": "VERY_HIGH/HIGH/MEDIUM/LOW/VERY_LOW",
    "next_steps": [
        "Concrete action step 1",
        "Concrete action step 2",
        ...
    ],
    "priority_improvements": [
        {
            "area": "Skill/Experience area",
            "current_state": "Current level/state",
            "target_state": "Desired level/state",
            "impact": "HIGH/MEDIUM/LOW",
            "effort": "HIGH/MEDIUM/LOW",
            "timeline": "Estimated time needed"
        }
    ],
    "learning_resources": [
        {
            "resource_type": "COURSE/CERTIFICATION/BOOK/PROJECT/PRACTICE",
            "title": "Resource title",
            "description": "What this resource covers",
            "estimated_duration": "Time to complete",
            "priority": "HIGH/MEDIUM/LOW"
        }
    ]
}

**SCORING GUIDELINES:**
- skills_match_score: How well user's skills match job requirements (0-100)
- experience_match_score: How well years and type of experience match (0-100)
- education_match_score: How well education matches requirements (0-100)
- culture_fit_score: Estimated culture/values alignment based on profile (0-100)
- location_match_score: Location/remote preference match (0-100)
- salary_match_score: Salary expectation vs offering alignment (0-100)
- technical_skills_score: Technical competencies only (0-100)
- soft_skills_score: Communication, leadership, teamwork, etc. (0-100)
- domain_knowledge_score: Industry/domain expertise (0-100)
- readiness_percentage: Overall readiness to apply and succeed (0-100)

Return ONLY the JSON object, no additional text.
"#;

/// Builds the analysis prompt. Byte-identical output for identical inputs:
/// struct field order is fixed, and nothing time- or randomness-dependent is
/// embedded.
pub fn build_analysis_prompt(
    user_context: &UserContext,
    job_context: &JobContext,
    additional_context: &str,
) -> Result<String, serde_json::Error> {
    let user_json = serde_json::to_string_pretty(user_context)?;
    let job_json = serde_json::to_string_pretty(job_context)?;

    let additional_section = if additional_context.is_empty() {
        String::new()
    } else {
        format!("\n\n**ADDITIONAL CONTEXT FROM CANDIDATE:**\n{additional_context}")
    };

    Ok(ANALYSIS_PROMPT_TEMPLATE
        .replace("{user_context}", &user_json)
        .replace("{job_context}", &job_json)
        .replace("{additional_section}", &additional_section))
}

/// Field names the schema promises and the parser expects. Kept next to the
/// template so a schema edit without a parser edit fails a test, not in prod.
#[cfg(test)]
pub const SCHEMA_FIELDS: [&str; 30] = [
    "eligibility_level",
    "match_score",
    "analysis_summary",
    "strengths",
    "gaps",
    "recommendations",
    "matching_skills",
    "missing_skills",
    "skill_gaps",
    "skills_match_score",
    "experience_match_score",
    "education_match_score",
    "culture_fit_score",
    "location_match_score",
    "salary_match_score",
    "technical_skills_score",
    "soft_skills_score",
    "domain_knowledge_score",
    "experience_match",
    "experience_gap_years",
    "years_of_experience_required",
    "years_of_experience_user",
    "readiness_percentage",
    "estimated_preparation_time",
    "confidence_level",
    "next_steps",
    "priority_improvements",
    "learning_resources",
    // not in the JSON schema block but part of the persisted record contract
    "full_analysis",
    "token_usage",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::context::build_user_context;
    use crate::models::job::JobRow;
    use crate::models::user::User;
    use chrono::Utc;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn fixture_contexts() -> (UserContext, JobContext) {
        let user = User {
            id: Uuid::nil(),
            email: "dev@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            created_at: Utc::now(),
        };
        let user_ctx = build_user_context(&user, None, None, &[], &[], &[], &[]);
        let job = JobRow {
            id: Uuid::nil(),
            title: "Senior Rust Engineer".to_string(),
            company_name: "Acme".to_string(),
            company_description: String::new(),
            description: "Build backend services.".to_string(),
            responsibilities: String::new(),
            requirements: "Rust, Postgres".to_string(),
            nice_to_have: String::new(),
            job_type: "FULL_TIME".to_string(),
            experience_level: "SENIOR".to_string(),
            location: "Remote".to_string(),
            is_remote: true,
            remote_policy: "REMOTE".to_string(),
            salary_min: None,
            salary_max: None,
            salary_currency: "USD".to_string(),
            salary_period: "YEARLY".to_string(),
            parsed_skills: json!([]),
            parsed_requirements: json!({}),
            source_url: None,
            source_platform: String::new(),
            status: "ACTIVE".to_string(),
            view_count: 0,
            created_at: Utc::now(),
        };
        let job_ctx = crate::analysis::context::build_job_context(&job, &[]);
        (user_ctx, job_ctx)
    }

    #[test]
    fn test_prompt_is_byte_identical_for_identical_inputs() {
        let (user_ctx, job_ctx) = fixture_contexts();
        let a = build_analysis_prompt(&user_ctx, &job_ctx, "knows Go").unwrap();
        let b = build_analysis_prompt(&user_ctx, &job_ctx, "knows Go").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_additional_section_only_when_nonempty() {
        let (user_ctx, job_ctx) = fixture_contexts();
        let without = build_analysis_prompt(&user_ctx, &job_ctx, "").unwrap();
        let with = build_analysis_prompt(&user_ctx, &job_ctx, "Has 3 years Python").unwrap();

        assert!(!without.contains("ADDITIONAL CONTEXT FROM CANDIDATE"));
        assert!(with.contains("**ADDITIONAL CONTEXT FROM CANDIDATE:**\nHas 3 years Python"));
    }

    #[test]
    fn test_prompt_embeds_both_contexts() {
        let (user_ctx, job_ctx) = fixture_contexts();
        let prompt = build_analysis_prompt(&user_ctx, &job_ctx, "").unwrap();
        assert!(prompt.contains("dev@example.com"));
        assert!(prompt.contains("Senior Rust Engineer"));
        assert!(prompt.contains("Return ONLY the JSON object"));
    }

    #[test]
    fn test_schema_names_every_parser_field() {
        // The prompt's schema block and the parser must agree field-for-field.
        for field in SCHEMA_FIELDS
            .iter()
            .filter(|f| **f != "full_analysis" && **f != "token_usage")
        {
            assert!(
                ANALYSIS_PROMPT_TEMPLATE.contains(&format!("\"{field}\"")),
                "schema is missing field {field}"
            );
        }
    }

    #[test]
    fn test_schema_matches_coerced_output_keys() {
        let coerced = crate::analysis::parser::parse_analysis_response("no json here");
        let value: Value = serde_json::to_value(&coerced).unwrap();
        let obj = value.as_object().unwrap();
        for field in SCHEMA_FIELDS {
            assert!(obj.contains_key(field), "coerced output lacks {field}");
        }
    }
}
