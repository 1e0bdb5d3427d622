// Prompt templates for the LLM-backed ranking collaborators.
// Placeholders in {braces} are filled with `str::replace` before the call.

pub const EXPERIENCE_EVAL_PROMPT_TEMPLATE: &str = r#"
You are assessing how well a freelancer's stated experience fits a job.

Job title: {job_title}
Expected seniority: {experience_level}
Required skills (JSON): {required_skills}

Candidate experience and cover letter:
"""
{experience_text}
"""

Judge only what the text supports. Do not reward length or confident tone on its own.
Return JSON with exactly these fields:
{
  "score": <number 0-100, experience quality and relevance for this job>,
  "confidence": <number 0-1, how much concrete evidence the text gives>
}
"#;

pub const NARRATION_PROMPT_TEMPLATE: &str = r#"
You are writing short, factual notes for a hiring manager comparing candidates for "{job_title}".

Each fact below compares one candidate's score on a dimension to the rest of the cohort.
"above_median" on any dimension is good for the candidate (a higher price score means a cheaper offer,
a higher delivery score means faster delivery).
"no_data" means the candidate did not provide that information.

Facts (JSON): {facts_json}

Write one short sentence per relevant fact. Do not invent facts that are not listed.
Return JSON with exactly these fields:
{
  "strengths": [<string>, ...],
  "weaknesses": [<string>, ...]
}
"#;
