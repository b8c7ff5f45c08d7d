pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod acquisition;
pub mod preprocess;
pub mod dispatch;
pub mod config;
pub mod error;
pub mod severity;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::{Dense, Layer};
pub use network::{ModelHandle, ModelMetadata, ModelSource, Network};
pub use acquisition::{upload_image, AcquisitionMethod, CaptureSession, ImageSource, SnapshotCamera};
pub use preprocess::{prepare, PreparedTensor};
pub use dispatch::{
    Completion, Dispatcher, LocalClassifier, ModelSlot, ModelStatus, Prediction, PredictionPath,
    PredictionResult, PredictionSource, RemoteClassifier, RequestToken, Session,
};
pub use config::ClassifierConfig;
pub use error::{AcquireError, ClassifyError, ModelError, NotReadyReason, PreprocessError};
pub use severity::SeverityLevel;
