//! Response Parser & Coercer — turns raw LLM text into a fully-populated
//! analysis result.
//!
//! Malformed model output is never a caller-visible failure: if no JSON
//! object can be located in the text, a fixed conservative fallback takes its
//! place and the raw text is preserved verbatim for human review. Each field
//! is then coerced independently, so one bad field never invalidates the
//! rest of the record.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use super::coerce::{ensure_list, extract_json_object, to_confidence, to_decimal, to_int, to_text};

/// All fields of an analysis result, always populated. Mirrors the JSON
/// schema embedded in the analysis prompt.
#[derive(Debug, Clone, Serialize)]
pub struct CoercedAnalysis {
    pub eligibility_level: String,
    pub match_score: i32,
    pub analysis_summary: String,
    pub strengths: Vec<Value>,
    pub gaps: Vec<Value>,
    pub recommendations: Vec<Value>,
    pub matching_skills: Vec<Value>,
    pub missing_skills: Vec<Value>,
    pub skill_gaps: Vec<Value>,
    pub skills_match_score: i32,
    pub experience_match_score: i32,
    pub education_match_score: i32,
    pub culture_fit_score: i32,
    pub location_match_score: i32,
    pub salary_match_score: i32,
    pub technical_skills_score: i32,
    pub soft_skills_score: i32,
    pub domain_knowledge_score: i32,
    pub experience_match: String,
    pub experience_gap_years: Option<f64>,
    pub years_of_experience_required: Option<f64>,
    pub years_of_experience_user: Option<f64>,
    pub readiness_percentage: i32,
    pub estimated_preparation_time: String,
    pub confidence_level: String,
    pub next_steps: Vec<Value>,
    pub priority_improvements: Vec<Value>,
    pub learning_resources: Vec<Value>,
    /// The complete raw response text, preserved even when parsing failed.
    pub full_analysis: String,
    /// Not instrumented — recorded as 0.
    pub token_usage: i32,
}

/// The fixed conservative result substituted when no JSON object can be
/// extracted from the response text.
fn fallback_object() -> Value {
    json!({
        "eligibility_level": "FAIR",
        "match_score": 50,
        "analysis_summary":
            "Analysis could not be parsed properly. Raw response available in full_analysis field.",
        "strengths": [],
        "gaps": [],
        "recommendations": [],
        "matching_skills": [],
        "missing_skills": [],
        "experience_match": "Unable to parse experience match",
        "experience_gap_years": null
    })
}

/// Parses raw LLM response text into a `CoercedAnalysis`.
///
/// Extraction takes the substring between the first `{` and the last `}`
/// (greedy) and parses it as JSON; on any failure the fallback object is
/// used instead. Coercion is pure, so parsing the same text twice yields
/// identical results.
pub fn parse_analysis_response(raw: &str) -> CoercedAnalysis {
    let result = match extract_json_object(raw) {
        Some(obj) => obj,
        None => {
            warn!("No parseable JSON object in LLM response; using fallback record");
            fallback_object()
        }
    };

    let get = |key: &str| result.get(key);

    CoercedAnalysis {
        eligibility_level: to_text(get("eligibility_level"), "FAIR"),
        match_score: to_int(get("match_score"), 50),
        analysis_summary: to_text(get("analysis_summary"), ""),
        strengths: ensure_list(get("strengths")),
        gaps: ensure_list(get("gaps")),
        recommendations: ensure_list(get("recommendations")),
        matching_skills: ensure_list(get("matching_skills")),
        missing_skills: ensure_list(get("missing_skills")),
        skill_gaps: ensure_list(get("skill_gaps")),
        skills_match_score: to_int(get("skills_match_score"), 0),
        experience_match_score: to_int(get("experience_match_score"), 0),
        education_match_score: to_int(get("education_match_score"), 0),
        culture_fit_score: to_int(get("culture_fit_score"), 0),
        location_match_score: to_int(get("location_match_score"), 0),
        salary_match_score: to_int(get("salary_match_score"), 0),
        technical_skills_score: to_int(get("technical_skills_score"), 0),
        soft_skills_score: to_int(get("soft_skills_score"), 0),
        domain_knowledge_score: to_int(get("domain_knowledge_score"), 0),
        experience_match: to_text(get("experience_match"), ""),
        experience_gap_years: to_decimal(get("experience_gap_years")),
        years_of_experience_required: to_decimal(get("years_of_experience_required")),
        years_of_experience_user: to_decimal(get("years_of_experience_user")),
        readiness_percentage: to_int(get("readiness_percentage"), 0),
        estimated_preparation_time: to_text(get("estimated_preparation_time"), ""),
        confidence_level: to_confidence(get("confidence_level")),
        next_steps: ensure_list(get("next_steps")),
        priority_improvements: ensure_list(get("priority_improvements")),
        learning_resources: ensure_list(get("learning_resources")),
        full_analysis: raw.to_string(),
        token_usage: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_json_in_fenced_prose_gets_defaults() {
        let raw = "Sure! ```json\n{\"match_score\": 85, \"eligibility_level\": \"GOOD\"}\n```";
        let parsed = parse_analysis_response(raw);

        assert_eq!(parsed.match_score, 85);
        assert_eq!(parsed.eligibility_level, "GOOD");
        // everything else takes its documented default
        assert_eq!(parsed.skills_match_score, 0);
        assert_eq!(parsed.readiness_percentage, 0);
        assert!(parsed.strengths.is_empty());
        assert!(parsed.next_steps.is_empty());
        assert_eq!(parsed.confidence_level, "MEDIUM");
        assert_eq!(parsed.experience_gap_years, None);
        assert_eq!(parsed.full_analysis, raw);
    }

    #[test]
    fn test_no_json_at_all_yields_fallback_record() {
        let raw = "I cannot analyze this.";
        let parsed = parse_analysis_response(raw);

        assert_eq!(parsed.eligibility_level, "FAIR");
        assert_eq!(parsed.match_score, 50);
        assert!(parsed
            .analysis_summary
            .contains("could not be parsed properly"));
        assert!(parsed.strengths.is_empty());
        assert!(parsed.gaps.is_empty());
        assert!(parsed.matching_skills.is_empty());
        assert_eq!(parsed.experience_match, "Unable to parse experience match");
        assert_eq!(parsed.experience_gap_years, None);
        // raw text preserved verbatim for audit
        assert_eq!(parsed.full_analysis, "I cannot analyze this.");
        assert_eq!(parsed.token_usage, 0);
    }

    #[test]
    fn test_scalar_string_list_field_wraps() {
        let raw = r#"{"matching_skills": "Python"}"#;
        let parsed = parse_analysis_response(raw);
        assert_eq!(parsed.matching_skills, vec![json!("Python")]);
    }

    #[test]
    fn test_json_array_text_list_field_parses() {
        let raw = r#"{"missing_skills": "[\"Python\",\"Go\"]"}"#;
        let parsed = parse_analysis_response(raw);
        assert_eq!(parsed.missing_skills, vec![json!("Python"), json!("Go")]);
    }

    #[test]
    fn test_bad_typed_list_field_becomes_empty() {
        let raw = r#"{"strengths": 42, "gaps": null}"#;
        let parsed = parse_analysis_response(raw);
        assert!(parsed.strengths.is_empty());
        assert!(parsed.gaps.is_empty());
    }

    #[test]
    fn test_single_bad_field_never_invalidates_the_record() {
        let raw = r#"{
            "match_score": "not a number",
            "eligibility_level": "EXCELLENT",
            "skills_match_score": 92,
            "confidence_level": "ABSOLUTELY",
            "years_of_experience_user": "lots"
        }"#;
        let parsed = parse_analysis_response(raw);

        assert_eq!(parsed.match_score, 50); // field-specific default
        assert_eq!(parsed.eligibility_level, "EXCELLENT");
        assert_eq!(parsed.skills_match_score, 92);
        assert_eq!(parsed.confidence_level, "MEDIUM");
        assert_eq!(parsed.years_of_experience_user, None);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let raw = r#"Here you go: {"match_score": 73, "strengths": ["Rust"], "confidence_level": "HIGH"}"#;
        let a = parse_analysis_response(raw);
        let b = parse_analysis_response(raw);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_structured_skill_gap_records_pass_through() {
        let raw = r#"{
            "skill_gaps": [{
                "skill_name": "Kubernetes",
                "required_level": "ADVANCED",
                "current_level": "BEGINNER",
                "gap_severity": "HIGH",
                "priority": "HIGH",
                "estimated_time_to_learn": "2-3 months"
            }]
        }"#;
        let parsed = parse_analysis_response(raw);
        assert_eq!(parsed.skill_gaps.len(), 1);
        assert_eq!(parsed.skill_gaps[0]["skill_name"], json!("Kubernetes"));
    }
}
