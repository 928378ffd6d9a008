//! Merge pipeline: resume, optional generated cover letter, and transcript into one PDF.
//!
//! Flow:
//! 1. Validate cover letter fields (before anything touches the disk)
//! 2. Discover the resume (`resume*.odt`) and transcript (`*transcript*.pdf`)
//! 3. Convert a scratch copy of the resume ─┐ concurrently
//! 4. Render + convert the cover letter    ─┘
//! 5. Concatenate in fixed order: resume, cover letter, transcript
//! 6. Read the merged file back and remove every scratch file, on every exit path

use std::path::{Path, PathBuf};
use std::time::Instant;

use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::documents::converter::Converter;
use crate::documents::pdf::merge_pdf_files;
use crate::documents::template::{render_cover_letter, RenderRequest};
use crate::documents::{DocumentError, SCRATCH_PREFIX, TEMPLATE_FILE_NAME};

/// Options for a merge request. Field names match the JSON body of `POST /api/pdf/merged`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeOptions {
    #[serde(default, rename = "coverletter")]
    pub cover_letter: bool,
    pub email: Option<String>,
    pub company: Option<String>,
    pub content: Option<String>,
}

impl MergeOptions {
    /// Returns the render request when a cover letter is wanted, or `MissingFields`
    /// naming every blank field.
    pub fn cover_letter_request(&self) -> Result<Option<RenderRequest>, DocumentError> {
        if !self.cover_letter {
            return Ok(None);
        }
        render_request(&self.email, &self.company, &self.content).map(Some)
    }
}

/// Builds a render request, or `MissingFields` naming every blank field in
/// `email`, `company`, `content` order.
pub fn render_request(
    email: &Option<String>,
    company: &Option<String>,
    content: &Option<String>,
) -> Result<RenderRequest, DocumentError> {
    let present = |value: &Option<String>| {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    };

    match (present(email), present(company), present(content)) {
        (Some(email), Some(company), Some(content)) => Ok(RenderRequest {
            email,
            company,
            content,
        }),
        (email, company, content) => {
            let mut missing = Vec::new();
            if email.is_none() {
                missing.push("email");
            }
            if company.is_none() {
                missing.push("company");
            }
            if content.is_none() {
                missing.push("content");
            }
            Err(DocumentError::MissingFields(missing))
        }
    }
}

/// Long-lived source files found in the working directory. Never deleted by a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInputs {
    pub resume: PathBuf,
    pub transcript: PathBuf,
}

/// Ordered list of PDFs to concatenate. The order is fixed, not caller-controlled.
#[derive(Debug)]
pub struct MergeSet {
    resume: PathBuf,
    cover_letter: Option<PathBuf>,
    transcript: PathBuf,
}

impl MergeSet {
    pub fn new(resume: PathBuf, cover_letter: Option<PathBuf>, transcript: PathBuf) -> Self {
        Self {
            resume,
            cover_letter,
            transcript,
        }
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        let mut paths = vec![self.resume];
        paths.extend(self.cover_letter);
        paths.push(self.transcript);
        paths
    }
}

fn is_resume(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.starts_with("resume") && lower.ends_with(".odt")
}

fn is_transcript(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("transcript") && lower.ends_with(".pdf")
}

/// Picks the first resume and first transcript in directory listing order.
pub async fn discover_inputs(work_dir: &Path) -> Result<MergeInputs, DocumentError> {
    let mut resume = None;
    let mut transcript = None;

    let mut entries = tokio::fs::read_dir(work_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(SCRATCH_PREFIX) || !entry.file_type().await?.is_file() {
            continue;
        }
        if resume.is_none() && is_resume(name) {
            resume = Some(entry.path());
        } else if transcript.is_none() && is_transcript(name) {
            transcript = Some(entry.path());
        }
        if resume.is_some() && transcript.is_some() {
            break;
        }
    }

    Ok(MergeInputs {
        resume: resume.ok_or(DocumentError::RequiredFileMissing("resume (.odt)"))?,
        transcript: transcript.ok_or(DocumentError::RequiredFileMissing("transcript (.pdf)"))?,
    })
}

/// Paths one merge invocation may create. All of them are removed by `cleanup`,
/// or by `Drop` if the merge future is cancelled first.
struct ScratchFiles {
    dir: PathBuf,
    token: String,
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            token: Uuid::new_v4().simple().to_string(),
            paths: Vec::new(),
        }
    }

    /// Registers and returns a unique path for `suffix`. Registration happens before the
    /// file exists so a failure halfway through still cleans it up.
    fn reserve(&mut self, suffix: &str) -> PathBuf {
        let path = self
            .dir
            .join(format!("{SCRATCH_PREFIX}{}-{suffix}", self.token));
        self.track(path.clone());
        path
    }

    fn track(&mut self, path: PathBuf) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    async fn cleanup(mut self) {
        for path in std::mem::take(&mut self.paths) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {e}", path.display()),
            }
        }
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Produces the merged PDF for `work_dir`.
///
/// Fails with `MissingFields` or `RequiredFileMissing` before any file is written.
/// Whatever happens after that, the directory is left exactly as it was found.
pub async fn merge_documents(
    work_dir: &Path,
    converter: &dyn Converter,
    options: &MergeOptions,
) -> Result<Bytes, DocumentError> {
    let started = Instant::now();

    let cover_request = options.cover_letter_request()?;
    let inputs = discover_inputs(work_dir).await?;
    info!(
        "Merging {} + {}{}",
        inputs.resume.display(),
        inputs.transcript.display(),
        if cover_request.is_some() {
            " with generated cover letter"
        } else {
            ""
        }
    );

    let mut scratch = ScratchFiles::new(work_dir);
    let result = run_merge(work_dir, converter, &inputs, cover_request, &mut scratch).await;
    scratch.cleanup().await;

    match &result {
        Ok(bytes) => info!(
            "Merge finished: {} bytes in {}ms",
            bytes.len(),
            started.elapsed().as_millis()
        ),
        Err(e) => warn!("Merge failed after {}ms: {e}", started.elapsed().as_millis()),
    }
    result
}

async fn run_merge(
    work_dir: &Path,
    converter: &dyn Converter,
    inputs: &MergeInputs,
    cover_request: Option<RenderRequest>,
    scratch: &mut ScratchFiles,
) -> Result<Bytes, DocumentError> {
    // Converting a private copy keeps the output name unique to this invocation.
    let resume_odt = scratch.reserve("resume.odt");
    scratch.reserve("resume.pdf");
    let cover_odt = cover_request.as_ref().map(|_| {
        scratch.reserve("cover-letter.pdf");
        scratch.reserve("cover-letter.odt")
    });
    let merged_pdf = scratch.reserve("merged.pdf");

    let resume_task = async {
        tokio::fs::copy(&inputs.resume, &resume_odt).await?;
        converter.convert_to_pdf(&resume_odt).await
    };

    let cover_task = async {
        match (cover_request, &cover_odt) {
            (Some(request), Some(odt_path)) => {
                let template = work_dir.join(TEMPLATE_FILE_NAME);
                let rendered = render_cover_letter(&template, &request).await?;
                tokio::fs::write(odt_path, rendered).await?;
                converter.convert_to_pdf(odt_path).await.map(Some)
            }
            _ => Ok(None),
        }
    };

    // Both branches run to completion before cleanup can start, so neither can write a file
    // after it has been removed.
    let (resume_pdf, cover_pdf) = tokio::join!(resume_task, cover_task);
    let (resume_pdf, cover_pdf) = (resume_pdf?, cover_pdf?);

    // A converter may report a different output location than the one reserved.
    scratch.track(resume_pdf.clone());
    if let Some(path) = &cover_pdf {
        scratch.track(path.clone());
    }

    let paths = MergeSet::new(resume_pdf, cover_pdf, inputs.transcript.clone()).into_paths();
    let output = merged_pdf.clone();
    let page_count =
        tokio::task::spawn_blocking(move || merge_pdf_files(&paths, &output)).await??;
    debug!("Merged document has {page_count} page(s)");

    let bytes = tokio::fs::read(&merged_pdf).await?;
    Ok(Bytes::from(bytes))
}
