use std::{sync::Arc, time::Instant};

use bytes::Bytes;
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::{
        renderer::{PdfRenderer, RenderError},
        stylesheet::inject_print_style,
    },
    domain::{conversion::ConversionRequest, error::DomainError, output::OutputFile},
    infra::storage::{OutputStore, StorageError},
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] DomainError),
    #[error("conversion failed: {message}")]
    ConversionFailed { message: String },
}

impl From<RenderError> for ExportError {
    fn from(error: RenderError) -> Self {
        Self::ConversionFailed {
            message: error.to_string(),
        }
    }
}

impl From<StorageError> for ExportError {
    fn from(error: StorageError) -> Self {
        Self::ConversionFailed {
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("generated file not found")]
    NotFound,
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for DownloadError {
    fn from(error: StorageError) -> Self {
        if error.is_not_found() {
            Self::NotFound
        } else {
            Self::Storage(error)
        }
    }
}

/// Runs the conversion pipeline: inject print CSS, render, persist, evict.
#[derive(Clone)]
pub struct PdfExportService {
    renderer: Arc<dyn PdfRenderer>,
    store: Arc<OutputStore>,
}

impl PdfExportService {
    pub fn new(renderer: Arc<dyn PdfRenderer>, store: Arc<OutputStore>) -> Self {
        Self { renderer, store }
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    pub async fn export(&self, request: ConversionRequest) -> Result<OutputFile, ExportError> {
        let started_at = Instant::now();
        // Only the first `<head>` is styled; nested `srcdoc` heads are left as sent.
        let document = inject_print_style(request.html());
        let layout = request.layout();

        let pdf = match self.renderer.render(&document, layout).await {
            Ok(pdf) => pdf,
            Err(err) => {
                counter!("stampa_export_total", "result" => "render_error").increment(1);
                warn!(
                    target = "application::export",
                    op = "export::render",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    error = %err,
                    "Renderer failed"
                );
                return Err(err.into());
            }
        };

        let stored = match self.store.persist(pdf).await {
            Ok(stored) => stored,
            Err(err) => {
                counter!("stampa_export_total", "result" => "storage_error").increment(1);
                return Err(err.into());
            }
        };

        // Eviction is best-effort and never fails the conversion.
        if let Err(err) = self.store.evict().await {
            warn!(
                target = "application::export",
                op = "export::evict",
                error = %err,
                "Retention pass did not run"
            );
        }

        counter!("stampa_export_total", "result" => "ok").increment(1);
        info!(
            target = "application::export",
            op = "export::pdf",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            file = %stored.file_name,
            size_bytes = stored.size_bytes,
            scale = layout.scale,
            width_px = layout.width_px,
            "Exported PDF"
        );

        Ok(stored)
    }

    pub async fn download(&self, file_name: &str) -> Result<Bytes, DownloadError> {
        self.store.read(file_name).await.map_err(DownloadError::from)
    }
}
