//! Headless Chromium renderer driven over the DevTools protocol.

use std::{
    io::Write,
    path::PathBuf,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bytes::Bytes;
use headless_chrome::{Browser, LaunchOptions, types::PrintToPdfOptions};
use metrics::histogram;
use tokio::task;
use tracing::{info, warn};
use url::Url;

use crate::{
    application::renderer::{PdfRenderer, RenderError},
    config::RenderSettings,
    domain::conversion::PageLayout,
};

const CSS_PX_PER_INCH: f64 = 96.0;
const CONTENT_HEIGHT_SCRIPT: &str = "Math.max(document.documentElement.scrollHeight, document.body ? document.body.scrollHeight : 0)";

/// Launches a fresh browser per conversion and prints the page as one continuous sheet.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    chrome_path: Option<PathBuf>,
    sandbox: bool,
    idle_timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            chrome_path: settings.chrome_path.clone(),
            sandbox: settings.sandbox,
            idle_timeout: settings.idle_timeout,
        }
    }

    fn render_blocking(&self, html: &str, layout: PageLayout) -> Result<Vec<u8>, RenderError> {
        let started_at = Instant::now();

        let mut source = tempfile::Builder::new()
            .prefix("stampa-")
            .suffix(".html")
            .tempfile()?;
        source.write_all(html.as_bytes())?;
        source.flush()?;
        let source_url = Url::from_file_path(source.path())
            .map_err(|_| RenderError::Load("temporary document path is not absolute".into()))?;

        let (_, format_height_px) = layout.format.size_px();
        let viewport_width = layout_width_px(layout);
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.sandbox)
            .path(self.chrome_path.clone())
            .window_size(Some((viewport_width, format_height_px)))
            .idle_browser_timeout(self.idle_timeout)
            .build()
            .map_err(|err| RenderError::Launch(err.to_string()))?;

        let browser = Browser::new(options).map_err(|err| {
            warn!(
                target = "infra::chromium",
                op = "chromium::render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error_code = "launch",
                error = %err,
                "Failed to launch headless Chromium"
            );
            RenderError::Launch(format!("{err:#}"))
        })?;

        let tab = browser
            .new_tab()
            .map_err(|err| RenderError::Launch(format!("{err:#}")))?;
        tab.navigate_to(source_url.as_str())
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|err| RenderError::Load(format!("{err:#}")))?;

        let content_height = tab
            .evaluate(CONTENT_HEIGHT_SCRIPT, false)
            .map_err(|err| RenderError::Load(format!("{err:#}")))?
            .value
            .and_then(|value| value.as_f64())
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(f64::from(format_height_px));

        let print_options = print_options(layout, content_height);
        let pdf = tab.print_to_pdf(Some(print_options)).map_err(|err| {
            warn!(
                target = "infra::chromium",
                op = "chromium::render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error_code = "print",
                error = %err,
                "Chromium failed to print PDF"
            );
            RenderError::Print(format!("{err:#}"))
        })?;

        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        histogram!("stampa_render_ms").record(elapsed_ms as f64);
        info!(
            target = "infra::chromium",
            op = "chromium::render",
            result = "ok",
            elapsed_ms = elapsed_ms,
            width_px = layout.width_px,
            scale = layout.scale,
            content_height_px = content_height,
            pdf_bytes = pdf.len(),
            "Rendered PDF via headless Chromium"
        );

        Ok(pdf)
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render(&self, html: &str, layout: PageLayout) -> Result<Bytes, RenderError> {
        let renderer = self.clone();
        let html = html.to_owned();
        task::spawn_blocking(move || renderer.render_blocking(&html, layout))
            .await
            .map_err(|err| RenderError::Task(err.to_string()))?
            .map(Bytes::from)
    }
}

/// Viewport width, in CSS pixels, that lays the page out the way it will be printed.
fn layout_width_px(layout: PageLayout) -> u32 {
    let width = (f64::from(layout.width_px) / layout.scale).ceil();
    width.clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Paper sized to the requested width and to the measured content height, so the
/// document prints as a single page instead of being paginated.
fn print_options(layout: PageLayout, content_height_px: f64) -> PrintToPdfOptions {
    let printed_height_px = (content_height_px * layout.scale).ceil().max(1.0);
    PrintToPdfOptions {
        print_background: Some(layout.print_background),
        scale: Some(layout.scale),
        paper_width: Some(f64::from(layout.width_px) / CSS_PX_PER_INCH),
        paper_height: Some(printed_height_px / CSS_PX_PER_INCH),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        ..Default::default()
    }
}
