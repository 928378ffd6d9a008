//! OpenDocument archive wrapper.
//!
//! An ODT file is a zip archive whose visible text lives in `content.xml`. `OdtDocument`
//! exposes only that body; every other entry is carried through serialization byte for byte,
//! which keeps the uncompressed `mimetype` entry first as the format requires.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::documents::template::TemplateError;

/// Archive entry holding the document body.
pub const BODY_ENTRY: &str = "content.xml";

pub struct OdtDocument {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    body: String,
}

impl OdtDocument {
    /// Reads an ODT from disk. The file itself is never modified.
    pub async fn open(path: &Path) -> Result<Self, TemplateError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TemplateError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TemplateError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut raw = Vec::new();
        match archive.by_name(BODY_ENTRY) {
            Ok(mut entry) => {
                entry.read_to_end(&mut raw)?;
            }
            Err(ZipError::FileNotFound) => return Err(TemplateError::BodyMissing),
            Err(e) => return Err(e.into()),
        }
        let body = String::from_utf8(raw)?;

        Ok(Self { archive, body })
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: String) {
        self.body = body;
    }

    /// Re-serializes the archive with the current body in place of the original entry.
    pub fn serialize(mut self) -> Result<Vec<u8>, TemplateError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for index in 0..self.archive.len() {
            let entry = self.archive.by_index_raw(index)?;
            if entry.name() == BODY_ENTRY {
                let options = SimpleFileOptions::default().compression_method(entry.compression());
                drop(entry);
                writer.start_file(BODY_ENTRY, options)?;
                writer.write_all(self.body.as_bytes())?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

/// Builds a minimal ODT archive around `body`. Shared by the document tests.
#[cfg(test)]
pub(crate) fn fixture_odt(body: &str) -> Vec<u8> {
    use zip::CompressionMethod;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file("mimetype", stored).unwrap();
    writer
        .write_all(b"application/vnd.oasis.opendocument.text")
        .unwrap();
    writer.start_file(BODY_ENTRY, deflated).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    writer.start_file("META-INF/manifest.xml", deflated).unwrap();
    writer.write_all(b"<manifest:manifest/>").unwrap();
    writer.finish().unwrap().into_inner()
}
