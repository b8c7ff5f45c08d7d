use std::io::{Cursor, Read};
use tiny_http::{Request, Response};

use acne_severity::upload_image;

use crate::routes::redirect;
use crate::state::{AppContext, FlashMessage};
use crate::util::multipart::{extract_boundary, extract_file_part};

/// Upper bound on an uploaded image.
const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// `POST /upload`
///
/// Expects a multipart form with an `image` file field. The part's own
/// Content-Type decides whether the file is accepted.
pub fn handle_upload(request: &mut Request, ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let flash = match read_upload(request, &content_type) {
        Ok((bytes, mime)) => match upload_image(bytes, &mime) {
            Ok(image) => {
                log::info!("accepted upload ({}, {} bytes)", image.mime(), image.bytes().len());
                let mut st = ctx.lock_state();
                st.session.acquire(image);
                None
            }
            Err(e) => {
                log::warn!("rejected upload: {}", e);
                Some(FlashMessage::error(e.user_notice()))
            }
        },
        Err(msg) => Some(FlashMessage::error(msg)),
    };

    if let Some(flash) = flash {
        let mut st = ctx.lock_state();
        st.flash = Some(flash);
    }
    redirect("/")
}

/// Reads the request body and pulls out the `image` part.
fn read_upload(request: &mut Request, content_type: &str) -> Result<(Vec<u8>, String), String> {
    let boundary = extract_boundary(content_type)
        .ok_or_else(|| "Expected a multipart/form-data upload.".to_owned())?;

    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_UPLOAD_BYTES + 1)
        .read_to_end(&mut body)
        .map_err(|e| format!("Failed to read upload: {}", e))?;
    if body.len() as u64 > MAX_UPLOAD_BYTES {
        return Err("The selected file is too large.".to_owned());
    }

    let part = extract_file_part(&body, &boundary, "image")
        .ok_or_else(|| "Please choose an image file.".to_owned())?;
    log::debug!("upload part {:?} ({})", part.filename, part.content_type);
    Ok((part.bytes, part.content_type))
}
