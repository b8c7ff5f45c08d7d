use std::path::PathBuf;

/// Notice shown for every remote failure, whatever the underlying cause.
pub const ANALYSIS_FAILED_NOTICE: &str = "Analysis failed. Please try again.";

/// Failures while obtaining an image from an upload or a camera.
#[derive(thiserror::Error, Debug)]
pub enum AcquireError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("no active camera stream")]
    NoActiveStream,
    #[error("could not read camera frame: {0}")]
    Frame(String),
}

impl AcquireError {
    pub fn user_notice(&self) -> String {
        match self {
            AcquireError::UnsupportedMediaType(_) => {
                "Please choose an image file.".to_owned()
            }
            AcquireError::PermissionDenied(_) | AcquireError::DeviceUnavailable(_) => {
                "Unable to access camera. Please check your permissions.".to_owned()
            }
            AcquireError::NoActiveStream => "Start the camera before capturing.".to_owned(),
            AcquireError::Frame(_) => "Could not capture a frame from the camera.".to_owned(),
        }
    }
}

/// Failures turning image bytes into a model input tensor.
#[derive(thiserror::Error, Debug)]
pub enum PreprocessError {
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero width or height")]
    EmptyImage,
}

/// Failures loading or running the classification model.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fetching {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("invalid model manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("invalid topology: {0}")]
    Topology(String),
    #[error("weight shard {name} has {len} bytes, not a multiple of 4")]
    ShardLength { name: String, len: usize },
    #[error("weights manifest declares {expected} values but shards hold {actual}")]
    WeightCount { expected: usize, actual: usize },
    #[error("input has {actual} values, model expects {expected}")]
    InputLength { expected: usize, actual: usize },
}

/// Why a local prediction could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// The model is still being fetched.
    ModelLoading,
    /// The model failed to load; local inference is off for this session.
    ModelUnavailable,
    NoImage,
}

/// Cause of a failed remote prediction. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    Status(u16),
    Transport(String),
    MalformedBody(String),
}

impl std::fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteFailure::Status(code) => write!(f, "HTTP status {}", code),
            RemoteFailure::Transport(msg) => write!(f, "transport error: {}", msg),
            RemoteFailure::MalformedBody(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

/// Failures of either prediction path.
#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("classifier not ready: {0:?}")]
    NotReady(NotReadyReason),
    #[error("no image to analyse")]
    NoImage,
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error("inference failed: {0}")]
    Inference(#[from] ModelError),
    #[error("model produced no usable score")]
    DegenerateOutput,
    #[error("inference task aborted: {0}")]
    TaskAborted(String),
    #[error("remote prediction rejected: {0}")]
    RemoteRejected(RemoteFailure),
}

impl ClassifyError {
    pub fn user_notice(&self) -> String {
        match self {
            ClassifyError::NotReady(NotReadyReason::ModelLoading) => {
                "Model is not loaded yet. Please wait.".to_owned()
            }
            ClassifyError::NotReady(NotReadyReason::ModelUnavailable) => {
                "The model could not be loaded. Local analysis is unavailable.".to_owned()
            }
            ClassifyError::NotReady(NotReadyReason::NoImage) | ClassifyError::NoImage => {
                "Please upload or capture an image first.".to_owned()
            }
            ClassifyError::Preprocess(_) => "The image could not be read.".to_owned(),
            ClassifyError::Inference(_)
            | ClassifyError::DegenerateOutput
            | ClassifyError::TaskAborted(_) => {
                "Error during prediction.".to_owned()
            }
            ClassifyError::RemoteRejected(_) => ANALYSIS_FAILED_NOTICE.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failures_share_one_notice() {
        let status = ClassifyError::RemoteRejected(RemoteFailure::Status(500));
        let transport = ClassifyError::RemoteRejected(RemoteFailure::Transport("refused".into()));
        let body = ClassifyError::RemoteRejected(RemoteFailure::MalformedBody("eof".into()));
        assert_eq!(status.user_notice(), ANALYSIS_FAILED_NOTICE);
        assert_eq!(transport.user_notice(), ANALYSIS_FAILED_NOTICE);
        assert_eq!(body.user_notice(), ANALYSIS_FAILED_NOTICE);
    }

    #[test]
    fn missing_image_notice_matches_for_both_paths() {
        let local = ClassifyError::NotReady(NotReadyReason::NoImage);
        assert_eq!(local.user_notice(), ClassifyError::NoImage.user_notice());
    }
}
