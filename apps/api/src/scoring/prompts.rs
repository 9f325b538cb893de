// LLM prompt constants for compatibility scoring.

/// System prompt — enforces JSON-only output.
pub const COMPAT_SCORE_SYSTEM: &str =
    "You are an expert technical recruiter evaluating how well a candidate \
    fits a job opening. You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Scoring prompt template. Replace `{candidate_profile}` and
/// `{vacancy_profile}` before sending.
pub const COMPAT_SCORE_PROMPT_TEMPLATE: &str = r#"Evaluate the candidate below against the vacancy and score the fit.

{candidate_profile}

{vacancy_profile}

Return a JSON object with this EXACT schema (no extra fields):
{
  "overall_score": 75,
  "skills_score": 80,
  "experience_score": 70,
  "culture_fit_score": 65,
  "strengths": ["Directly relevant Django experience"],
  "weaknesses": ["No PostgreSQL exposure"],
  "recommendation": "hire",
  "summary": "One-paragraph assessment of the fit.",
  "key_factors": ["Skill overlap on core stack"]
}

All scores are integers from 0 to 100. "recommendation" is one of
"hire", "maybe", "reject"."#;
