use std::io::Cursor;
use tiny_http::Response;

use acne_severity::{ModelStatus, PredictionResult, SeverityLevel};

use crate::render::{html_escape, render_flash_html, render_page};
use crate::routes::{html_response, image_response, not_found};
use crate::state::AppContext;

/// `GET /`
pub fn handle_get(ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    let model = ctx.slot.status();
    let mut st = ctx.lock_state();

    let controls = st.controls_mask(&model);
    let loading  = st.session.is_loading();
    let flash    = st.take_flash();

    let preview = if st.session.image().is_some() {
        r#"<img src="/image" alt="Selected image">"#.to_owned()
    } else {
        r#"<p class="empty">Upload an image or capture one from the camera.</p>"#.to_owned()
    };
    let camera = match st.capture.active_stream() {
        Some(id) => format!("Camera stream {} active", id.0),
        None     => "Camera off".to_owned(),
    };
    let result = st.session.result().map(render_result).unwrap_or_default();
    let backend = ctx.dispatcher.remote().endpoint().to_owned();
    drop(st);

    let html = render_page(controls, loading, |h| {
        h.replace("{{FLASH}}",         &render_flash_html(flash.as_ref()))
         .replace("{{MODEL_STATUS}}",  model_status_label(&model))
         .replace("{{BACKEND}}",       &html_escape(&backend))
         .replace("{{CAMERA_STATUS}}", &camera)
         .replace("{{PREVIEW}}",       &preview)
         .replace("{{RESULT}}",        &result)
    });
    html_response(html)
}

/// `GET /image`: the bytes of the current image.
pub fn handle_image(ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    let st = ctx.lock_state();
    match st.session.image() {
        Some(img) => image_response(img.bytes().to_vec(), img.mime()),
        None      => not_found(),
    }
}

fn model_status_label(status: &ModelStatus) -> &'static str {
    match status {
        ModelStatus::Unloaded | ModelStatus::Loading => "loading",
        ModelStatus::Ready(_)                        => "ready",
        ModelStatus::Failed(_)                       => "unavailable",
    }
}

/// Result card: the headline label, then per-level scores when the local
/// path produced them.
pub fn render_result(result: &PredictionResult) -> String {
    let mut html = format!(
        r#"<div class="prediction-hero">Predicted Acne Severity: <strong>{}</strong></div>
<div class="source">via {} model</div>"#,
        html_escape(&result.prediction.display_value()),
        result.source.as_str(),
    );

    if let Some(scores) = &result.scores {
        let top = result.severity();
        let max = scores.iter().cloned().fold(f64::MIN, f64::max).max(f64::EPSILON);
        html.push_str(r#"<table class="scores">"#);
        for (level, &score) in SeverityLevel::ALL.iter().zip(scores) {
            let pct = (score / max * 100.0).clamp(0.0, 100.0);
            let cls = if Some(*level) == top { r#" class="top""# } else { "" };
            html.push_str(&format!(
                r#"<tr{}><td>{}</td><td style="width:60%"><div class="bar-wrap"><div class="bar" style="width:{:.1}%"></div></div></td><td>{:.4}</td></tr>"#,
                cls, level.label(), pct, score
            ));
        }
        html.push_str("</table>");
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use acne_severity::{Prediction, PredictionSource};

    #[test]
    fn remote_result_has_no_score_table() {
        let result = PredictionResult {
            prediction: Prediction::Class(SeverityLevel::Moderate),
            source: PredictionSource::Remote,
            scores: None,
        };
        let html = render_result(&result);
        assert!(html.contains("<strong>Moderate</strong>"));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn local_result_highlights_top_level() {
        let result = PredictionResult {
            prediction: Prediction::Class(SeverityLevel::Severe),
            source: PredictionSource::Local,
            scores: Some(vec![0.1, 0.1, 0.2, 0.6]),
        };
        let html = render_result(&result);
        assert_eq!(html.matches("<tr").count(), 4);
        assert_eq!(html.matches(r#"class="top""#).count(), 1);
        assert!(html.contains("0.6000"));
    }
}
