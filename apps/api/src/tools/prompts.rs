// LLM prompt constants for the Tools module.
// Posting extraction reuses llm_client::prompts::JSON_ONLY_SYSTEM.

/// System prompt for cover letter drafting. Plain prose output, no JSON.
pub const COVER_LETTER_SYSTEM: &str = "You are an assistant that writes cover letters. \
    Write in a professional, specific, first-person voice. \
    Return only the body of the letter: no greeting block, no signature, no markdown.";

/// Cover letter prompt template. Replace `{company}`, `{job_posting}` and `{profile}`.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter for the job posting below.
Highlight how the candidate's qualifications, skills and experience match the requirements of the position.
Separate paragraphs with a blank line.

Company Name: {company}

Job Posting Information:
{job_posting}

Candidate Information:
{profile}"#;

/// Used when no candidate profile is configured.
pub const NO_PROFILE: &str =
    "Not provided. Focus on the posting and keep claims about the candidate general.";

/// Posting extraction prompt template. Replace `{page_text}` before sending.
pub const POSTING_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract the job details from the text of a job posting page.

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "Job title",
  "company": "Company name",
  "location": "City, region or Remote",
  "length": "Duration of the position, e.g. 4 months or Permanent",
  "posting": "The full job description, requirements and responsibilities"
}

Use null for any field the page does not state.

Page text:
{page_text}"#;
