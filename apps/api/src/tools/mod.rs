//! Assistant tools: cover letter drafting and job posting extraction.
//! Both go through the `TextGenerator` trait, never the Anthropic client directly.

pub mod cover_letter;
pub mod handlers;
pub mod prompts;
pub mod scraper;
