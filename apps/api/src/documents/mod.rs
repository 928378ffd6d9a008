// Document generation and merge pipeline.
// Implements: XML escaping, ODT template rendering, soffice conversion, PDF concatenation.
// Every intermediate file created by a merge is removed before the merge returns.

pub mod converter;
pub mod escape;
pub mod handlers;
pub mod merge;
pub mod odt;
pub mod pdf;
pub mod template;

use std::path::PathBuf;

use thiserror::Error;

pub use converter::{Converter, SofficeConverter};
pub use merge::{merge_documents, MergeOptions};
pub use template::{render_cover_letter, RenderRequest, TemplateError};

/// Reserved file name of the cover letter template inside the working directory.
pub const TEMPLATE_FILE_NAME: &str = "Cover_Letter_Template.odt";

/// Prefix shared by every scratch file a merge creates in the working directory.
pub const SCRATCH_PREFIX: &str = "merge-";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to render cover letter template: {0}")]
    TemplateRender(#[from] TemplateError),

    #[error("source file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("document conversion failed: {message}")]
    ConversionProcess { message: String },

    #[error("converter exited successfully but produced no output at {}", .0.display())]
    ConversionOutputMissing(PathBuf),

    #[error("required file missing from working directory: {0}")]
    RequiredFileMissing(&'static str),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("failed to merge PDFs: {0}")]
    PdfMerge(#[from] lopdf::Error),

    #[error("invalid PDF {}: {reason}", path.display())]
    InvalidPdf { path: PathBuf, reason: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
