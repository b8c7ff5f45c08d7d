use std::io::Cursor;
use tiny_http::Response;

use crate::routes::redirect;
use crate::state::{AppContext, FlashMessage};

/// `POST /camera/start`
pub fn handle_start(ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    let mut st = ctx.lock_state();
    match st.capture.start_capture() {
        Ok(id) => log::info!("camera stream {} started", id.0),
        Err(e) => {
            log::warn!("camera start failed: {}", e);
            st.flash = Some(FlashMessage::error(e.user_notice()));
        }
    }
    redirect("/")
}

/// `POST /camera/capture`
///
/// Grabs the current frame and makes it the session image. The stream stays
/// open.
pub fn handle_capture(ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    let mut st = ctx.lock_state();
    match st.capture.capture_frame() {
        Ok(image) => {
            st.session.acquire(image);
            st.flash = Some(FlashMessage::success("Image captured."));
        }
        Err(e) => {
            log::warn!("capture failed: {}", e);
            st.flash = Some(FlashMessage::error(e.user_notice()));
        }
    }
    redirect("/")
}

/// `POST /camera/stop`
pub fn handle_stop(ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    let mut st = ctx.lock_state();
    if st.capture.stop_capture() {
        log::info!("camera stream stopped");
    }
    redirect("/")
}
