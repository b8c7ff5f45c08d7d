pub mod camera;
pub mod source;

pub use camera::{Camera, CameraStream, CaptureSession, SnapshotCamera, StreamId};
pub use source::{guess_mime, upload_image, AcquisitionMethod, ImageSource};
