use std::io::{Cursor, ErrorKind};
use std::path::PathBuf;

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use log::{debug, info, warn};

use crate::acquisition::source::{AcquisitionMethod, ImageSource};
use crate::error::AcquireError;

/// A camera that can be opened into a live stream.
pub trait Camera: Send {
    /// Requests access to the device. Refusal by the user or the OS is
    /// `AcquireError::PermissionDenied`.
    fn open(&mut self) -> Result<Box<dyn CameraStream>, AcquireError>;
}

/// An open camera stream. Holds the hardware until `stop` is called.
pub trait CameraStream: Send {
    /// Current frame at the stream's native resolution.
    fn current_frame(&mut self) -> Result<RgbImage, AcquireError>;

    /// Releases every track of the stream.
    fn stop(&mut self);
}

/// Identifies one opened stream for logging and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamId(pub u64);

/// Exclusive owner of at most one camera stream.
///
/// Opening a new stream releases the previous one first, and dropping the
/// session releases whatever is open.
pub struct CaptureSession {
    camera: Box<dyn Camera>,
    active: Option<(StreamId, Box<dyn CameraStream>)>,
    next_id: u64,
}

impl CaptureSession {
    pub fn new(camera: Box<dyn Camera>) -> CaptureSession {
        CaptureSession { camera, active: None, next_id: 1 }
    }

    pub fn active_stream(&self) -> Option<StreamId> {
        self.active.as_ref().map(|(id, _)| *id)
    }

    pub fn start_capture(&mut self) -> Result<StreamId, AcquireError> {
        self.stop_capture();
        let stream = self.camera.open().map_err(|e| {
            warn!("camera open failed: {}", e);
            e
        })?;
        let id = StreamId(self.next_id);
        self.next_id += 1;
        info!("camera stream {} started", id.0);
        self.active = Some((id, stream));
        Ok(id)
    }

    /// Snapshots the current frame as a PNG image.
    pub fn capture_frame(&mut self) -> Result<ImageSource, AcquireError> {
        let (id, stream) = self.active.as_mut().ok_or(AcquireError::NoActiveStream)?;
        let frame = stream.current_frame()?;
        debug!("stream {}: captured {}x{} frame", id.0, frame.width(), frame.height());

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(frame)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .map_err(|e| AcquireError::Frame(e.to_string()))?;
        Ok(ImageSource::new(png, "image/png", AcquisitionMethod::Camera))
    }

    /// Releases the open stream. Returns `false` when nothing was open.
    pub fn stop_capture(&mut self) -> bool {
        match self.active.take() {
            Some((id, mut stream)) => {
                stream.stop();
                info!("camera stream {} stopped", id.0);
                true
            }
            None => false,
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_capture();
    }
}

/// A camera exposed as an image file that an external capture process keeps
/// rewriting (e.g. `/dev/shm/webcam.jpg`). Each capture re-reads the file.
pub struct SnapshotCamera {
    path: PathBuf,
}

impl SnapshotCamera {
    pub fn new(path: impl Into<PathBuf>) -> SnapshotCamera {
        SnapshotCamera { path: path.into() }
    }
}

impl Camera for SnapshotCamera {
    fn open(&mut self) -> Result<Box<dyn CameraStream>, AcquireError> {
        std::fs::File::open(&self.path).map_err(|e| device_error(&self.path, e))?;
        Ok(Box::new(SnapshotStream { path: self.path.clone(), live: true }))
    }
}

struct SnapshotStream {
    path: PathBuf,
    live: bool,
}

impl CameraStream for SnapshotStream {
    fn current_frame(&mut self) -> Result<RgbImage, AcquireError> {
        if !self.live {
            return Err(AcquireError::NoActiveStream);
        }
        let bytes = std::fs::read(&self.path).map_err(|e| device_error(&self.path, e))?;
        let img = image::load_from_memory(&bytes).map_err(|e| AcquireError::Frame(e.to_string()))?;
        Ok(img.to_rgb8())
    }

    fn stop(&mut self) {
        self.live = false;
    }
}

fn device_error(path: &std::path::Path, err: std::io::Error) -> AcquireError {
    let detail = format!("{}: {}", path.display(), err);
    match err.kind() {
        ErrorKind::PermissionDenied => AcquireError::PermissionDenied(detail),
        _ => AcquireError::DeviceUnavailable(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts opens and releases; refuses access when `deny` is set.
    struct FakeCamera {
        opened: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
        deny: bool,
    }

    struct FakeStream {
        released: Arc<AtomicUsize>,
    }

    impl Camera for FakeCamera {
        fn open(&mut self) -> Result<Box<dyn CameraStream>, AcquireError> {
            if self.deny {
                return Err(AcquireError::PermissionDenied("user refused".into()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeStream { released: self.released.clone() }))
        }
    }

    impl CameraStream for FakeStream {
        fn current_frame(&mut self) -> Result<RgbImage, AcquireError> {
            Ok(RgbImage::from_pixel(640, 480, Rgb([10, 20, 30])))
        }

        fn stop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fake(deny: bool) -> (CaptureSession, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let opened = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));
        let camera = FakeCamera { opened: opened.clone(), released: released.clone(), deny };
        (CaptureSession::new(Box::new(camera)), opened, released)
    }

    #[test]
    fn capture_keeps_native_resolution() {
        let (mut session, _, _) = fake(false);
        session.start_capture().unwrap();
        let img = session.capture_frame().unwrap();
        assert_eq!(img.mime(), "image/png");
        assert_eq!(img.method(), AcquisitionMethod::Camera);
        let decoded = image::load_from_memory(img.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (640, 480));
    }

    #[test]
    fn capture_without_stream_fails() {
        let (mut session, _, _) = fake(false);
        assert!(matches!(session.capture_frame(), Err(AcquireError::NoActiveStream)));
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut session, _, released) = fake(false);
        assert!(!session.stop_capture());
        session.start_capture().unwrap();
        assert!(session.stop_capture());
        assert!(!session.stop_capture());
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(session.active_stream(), None);
    }

    #[test]
    fn restart_releases_previous_stream() {
        let (mut session, opened, released) = fake(false);
        let first = session.start_capture().unwrap();
        let second = session.start_capture().unwrap();
        assert_ne!(first, second);
        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_open_stream() {
        let (mut session, _, released) = fake(false);
        session.start_capture().unwrap();
        drop(session);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn permission_denied_leaves_no_stream() {
        let (mut session, _, _) = fake(true);
        assert!(matches!(session.start_capture(), Err(AcquireError::PermissionDenied(_))));
        assert_eq!(session.active_stream(), None);
    }

    #[test]
    fn snapshot_camera_reads_file_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(8, 6, Rgb([1, 2, 3])).save(&path).unwrap();

        let mut session = CaptureSession::new(Box::new(SnapshotCamera::new(&path)));
        session.start_capture().unwrap();
        let img = session.capture_frame().unwrap();
        let decoded = image::load_from_memory(img.bytes()).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 6));
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn snapshot_camera_missing_device() {
        let mut camera = SnapshotCamera::new("/nonexistent/acne-severity/frame.png");
        assert!(matches!(camera.open(), Err(AcquireError::DeviceUnavailable(_))));
    }
}
