use std::sync::Arc;

use crate::application::export::PdfExportService;

#[derive(Clone)]
pub struct HttpState {
    pub exports: Arc<PdfExportService>,
    /// Return renderer failure text to callers instead of a generic message.
    pub expose_render_errors: bool,
}
