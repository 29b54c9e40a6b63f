// LLM prompt constants for the course flow's skill-gap analysis.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for skill-gap analysis. Replace `{json_only}` before sending.
pub const SKILL_GAP_SYSTEM: &str = "You are an experienced technical recruiter and career coach. \
    You compare a candidate's resume with the job descriptions they are targeting \
    and identify which required skills they already show and which they still need to learn. \
    {json_only}";

/// Skill-gap prompt template.
/// Replace: {resume_text}, {job_descriptions}, {max_missing}
pub const SKILL_GAP_PROMPT_TEMPLATE: &str = r#"Compare the RESUME with the JOB DESCRIPTIONS below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "Two or three sentences on overall fit and the biggest gaps.",
  "matched_skills": ["Rust", "PostgreSQL"],
  "missing_skills": [
    {"skill": "Kubernetes", "reason": "Required by 2 of 3 roles; no container orchestration on the resume"}
  ]
}

Rules:
1. A skill is MATCHED only if the resume gives concrete evidence of it (project, job, certification).
2. A skill is MISSING if any job description requires or strongly prefers it and the resume shows no evidence.
3. Use short canonical skill names ("Kubernetes", not "experience with Kubernetes clusters").
4. Order missing_skills by importance across all job descriptions, most important first.
5. List at most {max_missing} missing skills.
6. Do NOT invent experience that is not on the resume.

RESUME:
{resume_text}

JOB DESCRIPTIONS:
{job_descriptions}"#;
