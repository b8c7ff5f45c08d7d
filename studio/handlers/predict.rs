use std::io::Cursor;
use tiny_http::{Request, Response};

use acne_severity::{ClassifyError, Completion, ImageSource, PredictionPath, PredictionResult, RequestToken};

use crate::routes::redirect;
use crate::state::{AppContext, FlashMessage};
use crate::util::form::{form_get, parse_form};

/// `POST /predict` with form field `path=local|remote`.
///
/// The request is registered with the session, the state lock is released,
/// and the classification runs on the runtime. The outcome is applied only
/// if no newer image or dispatch arrived in the meantime.
pub fn handle_predict(request: &mut Request, ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        log::warn!("failed to read prediction form: {}", e);
        ctx.lock_state().flash = Some(FlashMessage::error("Failed to read the request."));
        return redirect("/");
    }
    let pairs = parse_form(&body);

    let path = match form_get(&pairs, "path") {
        Some("local")  => PredictionPath::Local,
        Some("remote") => PredictionPath::Remote,
        other => {
            log::warn!("unknown prediction path {:?}", other);
            return redirect("/");
        }
    };

    if let Some((token, image)) = begin_prediction(ctx, path) {
        let outcome = ctx.runtime.block_on(ctx.dispatcher.classify(path, image.as_ref()));
        finish_prediction(ctx, path, token, outcome);
    }
    redirect("/")
}

/// Registers a dispatch on `path`, or flashes why it cannot start. A refused
/// attempt leaves the session untouched.
fn begin_prediction(ctx: &AppContext, path: PredictionPath) -> Option<(RequestToken, Option<ImageSource>)> {
    let mut st = ctx.lock_state();
    if let Err(e) = ctx.dispatcher.ensure_ready(path, st.session.image()) {
        st.flash = Some(FlashMessage::error(e.user_notice()));
        return None;
    }
    Some(st.session.begin(path))
}

fn finish_prediction(
    ctx: &AppContext,
    path: PredictionPath,
    token: RequestToken,
    outcome: Result<PredictionResult, ClassifyError>,
) {
    let mut st = ctx.lock_state();
    match st.session.complete(token, outcome) {
        Completion::Applied => {}
        Completion::Failed(e) => {
            log::warn!("{:?} prediction failed: {}", path, e);
            st.flash = Some(FlashMessage::error(e.user_notice()));
        }
        Completion::Stale => log::debug!("{:?} prediction superseded", path),
    }
}
