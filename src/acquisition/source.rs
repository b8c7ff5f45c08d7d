use std::sync::Arc;

use crate::error::AcquireError;

/// How an image entered the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMethod {
    Upload,
    Camera,
}

/// Raw image bytes plus their media type. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    bytes: Arc<[u8]>,
    mime: String,
    method: AcquisitionMethod,
}

impl ImageSource {
    pub(crate) fn new(bytes: Vec<u8>, mime: impl Into<String>, method: AcquisitionMethod) -> ImageSource {
        ImageSource { bytes: bytes.into(), mime: mime.into(), method }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn method(&self) -> AcquisitionMethod {
        self.method
    }

    /// File name used when the image is sent as an upload part.
    pub fn file_name(&self) -> String {
        let ext = match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            _ => "png",
        };
        match self.method {
            AcquisitionMethod::Upload => format!("upload.{}", ext),
            AcquisitionMethod::Camera => format!("capture.{}", ext),
        }
    }
}

/// Accepts an uploaded file as the new image.
///
/// The only check is that `mime` names an `image/*` type; the bytes are not
/// decoded here. The caller makes the result current (see `Session::acquire`).
pub fn upload_image(bytes: Vec<u8>, mime: &str) -> Result<ImageSource, AcquireError> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    let is_image = essence
        .strip_prefix("image/")
        .map_or(false, |subtype| !subtype.is_empty());
    if !is_image {
        return Err(AcquireError::UnsupportedMediaType(mime.to_owned()));
    }
    Ok(ImageSource::new(bytes, essence, AcquisitionMethod::Upload))
}

/// Media type sniffed from the leading bytes of a supported image format.
pub fn guess_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        image::ImageFormat::Gif => Some("image/gif"),
        image::ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_any_image_subtype() {
        let img = upload_image(vec![1, 2, 3], "Image/JPEG; charset=binary").unwrap();
        assert_eq!(img.mime(), "image/jpeg");
        assert_eq!(img.method(), AcquisitionMethod::Upload);
        assert_eq!(img.file_name(), "upload.jpg");
        assert!(upload_image(vec![1], "image/x-anything").is_ok());
    }

    #[test]
    fn rejects_non_images() {
        for mime in ["text/plain", "application/octet-stream", "image/", ""] {
            assert!(
                matches!(upload_image(vec![1], mime), Err(AcquireError::UnsupportedMediaType(_))),
                "{}",
                mime
            );
        }
    }

    #[test]
    fn sniffs_png_signature() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(guess_mime(png), Some("image/png"));
        assert_eq!(guess_mime(b"hello"), None);
    }

    #[test]
    fn empty_file_is_accepted_and_fails_at_decode() {
        let img = upload_image(Vec::new(), "image/png").unwrap();
        assert!(img.bytes().is_empty());
        assert!(crate::preprocess::prepare(&img).is_err());
    }
}
