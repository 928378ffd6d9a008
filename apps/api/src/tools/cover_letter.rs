use tracing::info;

use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::tools::prompts::{COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM, NO_PROFILE};

/// Builds the cover letter prompt. A blank profile falls back to `NO_PROFILE`.
pub fn build_prompt(company: &str, job_posting: &str, profile: Option<&str>) -> String {
    let profile = profile
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(NO_PROFILE);
    COVER_LETTER_PROMPT_TEMPLATE
        .replace("{company}", company.trim())
        .replace("{job_posting}", job_posting.trim())
        .replace("{profile}", profile)
}

/// Drafts cover letter content for `company` from the posting text.
pub async fn generate_cover_letter(
    llm: &dyn TextGenerator,
    company: &str,
    job_posting: &str,
    profile: Option<&str>,
) -> Result<String, AppError> {
    if company.trim().is_empty() || job_posting.trim().is_empty() {
        return Err(AppError::Validation(
            "Company and job posting details are required".to_string(),
        ));
    }

    let prompt = build_prompt(company, job_posting, profile);
    let letter = llm
        .generate_text(&prompt, COVER_LETTER_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("cover letter generation failed: {e}")))?;

    info!("Generated cover letter for {} ({} chars)", company.trim(), letter.len());
    Ok(letter)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::LlmError;

    #[derive(Default)]
    struct Recording {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Recording {
        async fn generate_text(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Dear team,\n\nI am writing...".to_string())
        }
    }

    #[test]
    fn test_prompt_includes_company_posting_and_profile() {
        let prompt = build_prompt(" Acme ", "Build rockets", Some("Rust developer"));
        assert!(prompt.contains("Company Name: Acme\n"));
        assert!(prompt.contains("Build rockets"));
        assert!(prompt.contains("Rust developer"));
    }

    #[test]
    fn test_prompt_without_profile_uses_fallback() {
        let prompt = build_prompt("Acme", "Build rockets", Some("   "));
        assert!(prompt.contains(NO_PROFILE));
    }

    #[tokio::test]
    async fn test_blank_inputs_never_reach_the_generator() {
        let llm = Recording::default();
        let err = generate_cover_letter(&llm, "Acme", "  ", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = generate_cover_letter(&llm, "", "posting", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_returns_generated_text() {
        let llm = Recording::default();
        let letter = generate_cover_letter(&llm, "Acme", "Build rockets", None)
            .await
            .unwrap();
        assert!(letter.starts_with("Dear team"));
        assert_eq!(llm.prompts.lock().unwrap().len(), 1);
    }
}
