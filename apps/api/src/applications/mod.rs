//! Job application records and their saved cover letters.

pub mod handlers;
pub mod repository;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;

pub const DEFAULT_STATUS: &str = "Not Applied";

/// Create/update body. Optional text fields are stored as given; blank `status` falls back
/// to `Not Applied`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    pub location: Option<String>,
    pub length: Option<String>,
    pub url: Option<String>,
    pub posting: Option<String>,
    pub status: Option<String>,
    pub applied: Option<NaiveDate>,
    pub added: Option<NaiveDate>,
}

impl ApplicationInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.company.trim().is_empty() {
            missing.push("company");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn status_or_default(&self) -> &str {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STATUS)
    }
}

#[derive(Debug, Deserialize)]
pub struct CoverLetterInput {
    #[serde(default)]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_title_and_company() {
        let err = ApplicationInput::default().validate().unwrap_err();
        assert!(err.to_string().contains("title, company"));

        let input = ApplicationInput {
            title: "Engineer".to_string(),
            company: "  ".to_string(),
            ..Default::default()
        };
        assert!(input.validate().unwrap_err().to_string().contains("company"));
    }

    #[test]
    fn test_validate_accepts_minimal_input() {
        let input = ApplicationInput {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
        assert_eq!(input.status_or_default(), DEFAULT_STATUS);
    }

    #[test]
    fn test_deserializes_dates() {
        let input: ApplicationInput = serde_json::from_str(
            r#"{"title":"t","company":"c","status":"Applied","applied":"2024-03-01"}"#,
        )
        .unwrap();
        assert_eq!(input.status_or_default(), "Applied");
        assert_eq!(input.applied, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(input.added.is_none());
    }
}
