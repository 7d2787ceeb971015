use std::{fmt, path::PathBuf};

use uuid::Uuid;

pub const OUTPUT_EXTENSION: &str = "pdf";

/// Random 128-bit identifier of a generated PDF, rendered as 32 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputFileId(Uuid);

impl OutputFileId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn file_name(&self) -> String {
        format!("{self}.{OUTPUT_EXTENSION}")
    }
}

impl fmt::Display for OutputFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A PDF persisted in the output directory.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl OutputFile {
    /// Relative URL the download endpoint resolves.
    pub fn download_url(&self) -> String {
        format!("/download_pdf/{}", self.file_name)
    }
}
