use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::conversion::PageLayout;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("failed to load document: {0}")]
    Load(String),
    #[error("failed to print PDF: {0}")]
    Print(String),
    #[error("renderer I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("renderer task failed: {0}")]
    Task(String),
}

/// Turns a complete HTML document into PDF bytes.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str, layout: PageLayout) -> Result<Bytes, RenderError>;
}
