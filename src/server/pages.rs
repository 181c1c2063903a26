use crate::models::ImagePreview;

/// The whole demo is one HTML template with placeholder tokens like
/// `{{TOKEN}}`, loaded at compile time. `render_page` accepts a closure that
/// substitutes the request-specific tokens, and any token the closure did
/// not fill is blanked so raw `{{TOKEN}}` strings never reach the browser.
const TEMPLATE: &str = include_str!("assets/page.html");

/// Renders the page.
///
/// # Arguments
/// - `fill` - closure that fills request-specific placeholders
pub fn render_page<F>(fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    blank_remaining(fill(TEMPLATE.to_owned()))
}

/// Replaces any `{{UPPERCASE_TOKEN}}` that wasn't already substituted with an
/// empty string. All tokens should be handled by the caller; a missed token
/// should produce a clean page rather than leaking template internals.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        if let Some(end) = html[start..].find("}}") {
            let abs_end = start + end + 2;
            html.replace_range(start..abs_end, "");
        } else {
            break;
        }
    }
    html
}

/// Escapes user-controlled text for interpolation into HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Page blocks
// ---------------------------------------------------------------------------

pub fn warning_banner(message: &str) -> String {
    format!(
        "<div class=\"banner warning\">⚠️ {}</div>",
        escape_html(message)
    )
}

pub fn error_banner(message: &str) -> String {
    format!(
        "<div class=\"banner error\">❌ {}</div>",
        escape_html(message)
    )
}

pub fn preview_block(preview: &ImagePreview) -> String {
    format!(
        concat!(
            "<figure class=\"preview\">",
            "<img src=\"{}\" width=\"{}\" height=\"{}\" alt=\"Image preview\">",
            "<figcaption>Source: {}</figcaption>",
            "</figure>"
        ),
        preview.data_url(),
        preview.display_width,
        preview.display_height,
        escape_html(&preview.source_url)
    )
}

pub fn response_block(text: &str) -> String {
    format!(
        concat!(
            "<section class=\"response\">",
            "<h2>📝 Model Response</h2>",
            "<p><strong>Description</strong>: {}</p>",
            "</section>"
        ),
        escape_html(text)
    )
}
