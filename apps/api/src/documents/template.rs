//! Cover letter rendering: fills the ODT template's placeholder tokens with escaped values.

use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::documents::escape::escape_xml;
use crate::documents::odt::OdtDocument;

/// Structural line-break element of the OpenDocument text format.
pub const LINE_BREAK: &str = "<text:line-break/>";

pub const EMAIL_TOKEN: &str = "##EMAIL##";
pub const COMPANY_TOKEN: &str = "##COMPANY##";
pub const CONTENT_TOKEN: &str = "##CONTENT##";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"##(EMAIL|COMPANY|CONTENT)##").expect("valid placeholder regex"));
// `\s*` also swallows further newlines, so any run of blank lines is one paragraph break.
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n\s*").expect("valid paragraph regex"));
static LINE_BREAK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*").expect("valid line regex"));

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("cannot read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("template archive has no content.xml entry")]
    BodyMissing,

    #[error("template body is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error while rewriting archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Values substituted into the cover letter template.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    pub email: String,
    pub company: String,
    pub content: String,
}

/// Renders the template at `template_path` and returns the new ODT archive bytes.
pub async fn render_cover_letter(
    template_path: &Path,
    request: &RenderRequest,
) -> Result<Vec<u8>, TemplateError> {
    let document = OdtDocument::open(template_path).await?;
    render_document(document, request)
}

/// Substitutes placeholders in an already loaded template.
pub fn render_document(
    mut document: OdtDocument,
    request: &RenderRequest,
) -> Result<Vec<u8>, TemplateError> {
    let email = neutralize_tokens(escape_xml(&request.email));
    let company = neutralize_tokens(escape_xml(&request.company));
    let content = neutralize_tokens(format_content(&request.content));

    let body = PLACEHOLDER
        .replace_all(document.body(), |caps: &Captures| match &caps[1] {
            "EMAIL" => email.clone(),
            "COMPANY" => company.clone(),
            _ => content.clone(),
        })
        .into_owned();

    debug!(
        "Rendered cover letter body ({} bytes, content {} bytes)",
        body.len(),
        content.len()
    );

    document.set_body(body);
    document.serialize()
}

/// Escapes letter content and converts newlines into structural line breaks.
///
/// A blank-line paragraph break becomes two markers, a single newline becomes one.
/// Whitespace following a newline is dropped.
pub fn format_content(content: &str) -> String {
    let escaped = escape_xml(&content.replace("\r\n", "\n"));
    let double = format!("{LINE_BREAK}{LINE_BREAK}");
    let paragraphs = PARAGRAPH_BREAK.replace_all(&escaped, double.as_str());
    LINE_BREAK_RUN
        .replace_all(&paragraphs, LINE_BREAK)
        .into_owned()
}

/// Replaces the leading '#' of any placeholder-looking text in a value with a character
/// reference, so substituted values can never reintroduce a token.
fn neutralize_tokens(value: String) -> String {
    if !PLACEHOLDER.is_match(&value) {
        return value;
    }
    PLACEHOLDER
        .replace_all(&value, |caps: &Captures| format!("&#35;#{}##", &caps[1]))
        .into_owned()
}
