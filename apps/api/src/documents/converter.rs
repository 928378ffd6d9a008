//! Office document → PDF conversion.
//!
//! `Converter` is the seam the merge pipeline depends on. The default backend spawns
//! LibreOffice (`soffice --headless --convert-to pdf`) once per call; tests swap in fakes.
//!
//! Two concurrent conversions of the same input race on the same output path. The merge
//! pipeline avoids that by converting uniquely named scratch copies.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::documents::DocumentError;

#[async_trait]
pub trait Converter: Send + Sync {
    /// Converts `input` into `<same dir>/<same stem>.pdf` and returns that path.
    /// The returned path exists on disk when this succeeds.
    async fn convert_to_pdf(&self, input: &Path) -> Result<PathBuf, DocumentError>;
}

/// Output path produced by converting `input`: same directory and stem, `.pdf` extension.
pub fn pdf_output_path(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

/// Converter backed by the LibreOffice command line.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: String,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Converter for SofficeConverter {
    async fn convert_to_pdf(&self, input: &Path) -> Result<PathBuf, DocumentError> {
        if !tokio::fs::try_exists(input).await? {
            return Err(DocumentError::FileNotFound(input.to_path_buf()));
        }

        let output_path = pdf_output_path(input);
        let out_dir = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        debug!(
            "Converting {} to PDF with {} (timeout {:?})",
            input.display(),
            self.program,
            self.timeout
        );

        let child = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg(input)
            .arg("--outdir")
            .arg(out_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DocumentError::ConversionProcess {
                message: format!("failed to start '{}': {e}", self.program),
            })?;

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| DocumentError::ConversionProcess {
                message: format!("failed waiting for '{}': {e}", self.program),
            })?,
            Err(_) => {
                warn!(
                    "Conversion of {} timed out after {:?}; process killed",
                    input.display(),
                    self.timeout
                );
                return Err(DocumentError::ConversionProcess {
                    message: format!(
                        "'{}' timed out after {:?} converting {}",
                        self.program,
                        self.timeout,
                        input.display()
                    ),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let diagnostics = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            warn!("LibreOffice conversion error: {diagnostics}");
            return Err(DocumentError::ConversionProcess {
                message: format!("'{}' exited with {}: {diagnostics}", self.program, output.status),
            });
        }

        if !tokio::fs::try_exists(&output_path).await? {
            return Err(DocumentError::ConversionOutputMissing(output_path));
        }

        info!("Converted {}", output_path.display());
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(program: &str) -> SofficeConverter {
        SofficeConverter::new(program, Duration::from_secs(10))
    }

    #[test]
    fn test_output_path_swaps_extension() {
        assert_eq!(
            pdf_output_path(Path::new("/work/resume-file-1.odt")),
            PathBuf::from("/work/resume-file-1.pdf")
        );
        assert_eq!(
            pdf_output_path(Path::new("letter")),
            PathBuf::from("letter.pdf")
        );
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("absent.odt");
        // A program that cannot be spawned would yield ConversionProcess if it were tried.
        let err = converter("/nonexistent/soffice")
            .convert_to_pdf(&input)
            .await
            .unwrap_err();
        match err {
            DocumentError::FileNotFound(path) => assert_eq!(path, input),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unstartable_program_is_a_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("letter.odt");
        std::fs::write(&input, b"odt").unwrap();

        let err = converter("/nonexistent/soffice")
            .convert_to_pdf(&input)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::ConversionProcess { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_a_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("letter.odt");
        std::fs::write(&input, b"odt").unwrap();

        let err = converter("false").convert_to_pdf(&input).await.unwrap_err();
        assert!(matches!(err, DocumentError::ConversionProcess { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("letter.odt");
        std::fs::write(&input, b"odt").unwrap();

        let err = converter("true").convert_to_pdf(&input).await.unwrap_err();
        match err {
            DocumentError::ConversionOutputMissing(path) => {
                assert_eq!(path, dir.path().join("letter.pdf"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_existing_output_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("letter.odt");
        std::fs::write(&input, b"odt").unwrap();
        // `true` ignores its arguments; the PDF is already where soffice would write it.
        std::fs::write(dir.path().join("letter.pdf"), b"%PDF-1.5").unwrap();

        let output = converter("true").convert_to_pdf(&input).await.unwrap();
        assert_eq!(output, dir.path().join("letter.pdf"));
        assert!(output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process_and_reports() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("letter.odt");
        std::fs::write(&input, b"odt").unwrap();
        let program = dir.path().join("slow-soffice");
        std::fs::write(&program, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let converter = SofficeConverter::new(
            program.to_string_lossy().to_string(),
            Duration::from_millis(300),
        );
        let started = std::time::Instant::now();
        let err = converter.convert_to_pdf(&input).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            DocumentError::ConversionProcess { message } => {
                assert!(message.contains("timed out after 300ms"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("letter.pdf").exists());
    }
}
