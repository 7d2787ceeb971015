//! Conversion request values and their validation rules.

use serde_json::Value;

use super::error::DomainError;

pub const DEFAULT_SCALE: f64 = 1.0;
pub const DEFAULT_WIDTH_PX: u32 = 1200;

/// Paper size the renderer starts from before width and height are overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    A4,
}

impl PageFormat {
    /// Page dimensions in CSS pixels (96 per inch).
    pub fn size_px(self) -> (u32, u32) {
        match self {
            PageFormat::A4 => (794, 1123),
        }
    }
}

/// Renderer-facing layout parameters for a single conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub format: PageFormat,
    pub scale: f64,
    pub width_px: u32,
    pub print_background: bool,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            scale: DEFAULT_SCALE,
            width_px: DEFAULT_WIDTH_PX,
            print_background: true,
        }
    }
}

/// A validated request to turn one HTML document into a PDF.
///
/// Construction guarantees non-empty HTML and a usable layout, so the
/// renderer is never reached with input that would be rejected.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    html: String,
    layout: PageLayout,
}

impl ConversionRequest {
    pub fn new(html: String, layout: PageLayout) -> Result<Self, DomainError> {
        if html.is_empty() {
            return Err(DomainError::validation("No HTML provided"));
        }
        if !layout.scale.is_finite() || layout.scale <= 0.0 {
            return Err(DomainError::validation(
                "scale must be a positive number",
            ));
        }
        if layout.width_px == 0 {
            return Err(DomainError::validation(
                "width must be a positive integer",
            ));
        }
        Ok(Self { html, layout })
    }

    /// Build a request from loosely-typed payload fields.
    ///
    /// `scale` and `width` accept JSON numbers or numeric strings; a missing
    /// or `null` value falls back to the default.
    pub fn from_payload(
        html: Option<String>,
        scale: Option<&Value>,
        width: Option<&Value>,
    ) -> Result<Self, DomainError> {
        let html = html.unwrap_or_default();
        if html.is_empty() {
            return Err(DomainError::validation("No HTML provided"));
        }

        let layout = PageLayout {
            scale: coerce_scale(scale)?,
            width_px: coerce_width(width)?,
            ..PageLayout::default()
        };

        Self::new(html, layout)
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }
}

fn coerce_scale(value: Option<&Value>) -> Result<f64, DomainError> {
    let scale = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_SCALE),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(Value::Bool(flag)) => Some(if *flag { 1.0 } else { 0.0 }),
        Some(_) => None,
    };

    scale
        .filter(|value| value.is_finite())
        .ok_or_else(|| DomainError::validation("scale must be a number"))
}

fn coerce_width(value: Option<&Value>) -> Result<u32, DomainError> {
    let width = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_WIDTH_PX),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(integer) => Some(integer),
            // Fractional widths are truncated toward zero.
            None => number
                .as_f64()
                .filter(|value| value.is_finite())
                .map(|value| value.trunc() as i64),
        },
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        Some(Value::Bool(flag)) => Some(i64::from(*flag)),
        Some(_) => None,
    };

    let width = width.ok_or_else(|| DomainError::validation("width must be an integer"))?;
    u32::try_from(width)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| DomainError::validation("width must be a positive integer"))
}
