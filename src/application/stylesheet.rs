//! Print stylesheet injected into every document before rendering.

const HEAD_OPEN: &str = "<head>";

/// Forces full-width layout and keeps elements from being split across page boundaries.
pub const PRINT_STYLE: &str = "<style>
html, body { width: 100%; }
* { box-sizing: border-box; }
@media print {
  html, body { width: 100%; }
  body { margin: 0; }
  .no-break, * { page-break-before: auto !important; page-break-after: auto !important; page-break-inside: avoid !important; }
}
</style>";

/// Insert [`PRINT_STYLE`] right after the first `<head>` tag, or prepend it when there is none.
pub fn inject_print_style(html: &str) -> String {
    let mut output = String::with_capacity(html.len() + PRINT_STYLE.len());
    match html.find(HEAD_OPEN) {
        Some(index) => {
            let split = index + HEAD_OPEN.len();
            output.push_str(&html[..split]);
            output.push_str(PRINT_STYLE);
            output.push_str(&html[split..]);
        }
        None => {
            output.push_str(PRINT_STYLE);
            output.push_str(html);
        }
    }
    output
}
