use crate::state::{FlashKind, FlashMessage};

/// Template renderer for the severity studio.
///
/// The studio uses a single HTML template (`studio/assets/studio.html`) with
/// placeholder tokens like `{{TOKEN}}`.  The template is loaded at compile
/// time; `render_page` resolves the global tokens and hands the rest to a
/// closure.  Tokens the closure leaves alone are blanked so raw `{{TOKEN}}`
/// strings never reach the browser.
const TEMPLATE: &str = include_str!("assets/studio.html");

/// Renders the full studio page.
///
/// # Arguments
/// - `controls`: bitmask; see `StudioState::controls_mask()`
/// - `loading` : whether a prediction is in flight
/// - `fill`    : closure that fills the remaining placeholders
pub fn render_page<F>(controls: u8, loading: bool, fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    let mut html = TEMPLATE.to_owned();

    html = html.replace("{{CONTROLS}}", &controls.to_string());
    html = html.replace("{{LOADING}}",  if loading { "true" } else { "false" });

    html = fill(html);

    blank_remaining(html)
}

/// Replaces any `{{UPPERCASE_TOKEN}}` that wasn't already substituted with an
/// empty string.
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

pub fn render_flash_html(flash: Option<&FlashMessage>) -> String {
    match flash {
        None    => String::new(),
        Some(f) => {
            let cls = match f.kind {
                FlashKind::Success => "flash-success",
                FlashKind::Error   => "flash-error",
            };
            format!(r#"<div class="flash {}">{}</div>"#, cls, html_escape(&f.text))
        }
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfilled_tokens_are_blanked() {
        let html = render_page(0b1001, false, |h| h.replace("{{RESULT}}", "<p>ok</p>"));
        assert!(!html.contains("{{"));
        assert!(html.contains("<p>ok</p>"));
        assert!(html.contains("const CONTROLS = 9;"));
    }

    #[test]
    fn flash_text_is_escaped() {
        let html = render_flash_html(Some(&FlashMessage::error("<b>bad</b>")));
        assert!(html.contains("flash-error"));
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
    }
}
