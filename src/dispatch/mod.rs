pub mod local;
pub mod model_slot;
pub mod prediction;
pub mod remote;
pub mod session;

pub use local::{load_severity_model, LocalClassifier};
pub use model_slot::{ModelSlot, ModelStatus};
pub use prediction::{Prediction, PredictionResult, PredictionSource};
pub use remote::{parse_prediction, RemoteClassifier};
pub use session::{Completion, PredictionPath, RequestToken, Session};

use std::sync::Arc;

use crate::acquisition::ImageSource;
use crate::config::ClassifierConfig;
use crate::error::{ClassifyError, NotReadyReason};

/// Routes a classification request to the local or the remote path.
///
/// The two paths are independent: either may be in flight while the other
/// runs, and neither can be cancelled once started.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    local: LocalClassifier,
    remote: RemoteClassifier,
}

impl Dispatcher {
    pub fn new(local: LocalClassifier, remote: RemoteClassifier) -> Dispatcher {
        Dispatcher { local, remote }
    }

    /// Wires both paths from configuration around an injected model slot.
    pub fn from_config(config: &ClassifierConfig, slot: Arc<ModelSlot>, client: reqwest::Client) -> Dispatcher {
        Dispatcher {
            local: LocalClassifier::new(slot),
            remote: RemoteClassifier::new(client, config.predict_endpoint()),
        }
    }

    pub fn local(&self) -> &LocalClassifier {
        &self.local
    }

    pub fn remote(&self) -> &RemoteClassifier {
        &self.remote
    }

    /// Checks what `classify` would refuse up front, without dispatching.
    ///
    /// Callers use this to reject a request before registering it with a
    /// `Session`, so a refused attempt leaves any in-flight request alone.
    pub fn ensure_ready(&self, path: PredictionPath, image: Option<&ImageSource>) -> Result<(), ClassifyError> {
        match path {
            PredictionPath::Local => {
                self.local.slot().handle()?;
                image.ok_or(ClassifyError::NotReady(NotReadyReason::NoImage))?;
            }
            PredictionPath::Remote => {
                image.ok_or(ClassifyError::NoImage)?;
            }
        }
        Ok(())
    }

    pub async fn classify(
        &self,
        path: PredictionPath,
        image: Option<&ImageSource>,
    ) -> Result<PredictionResult, ClassifyError> {
        match path {
            PredictionPath::Local => self.local.classify(image).await,
            PredictionPath::Remote => self.remote.classify(image).await,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::upload_image;

    fn dispatcher() -> Dispatcher {
        let config = ClassifierConfig::new("http://127.0.0.1:9", "public/models");
        Dispatcher::from_config(&config, Arc::new(ModelSlot::new()), reqwest::Client::new())
    }

    #[test]
    fn local_waits_for_model_before_image() {
        let d = dispatcher();
        assert!(matches!(
            d.ensure_ready(PredictionPath::Local, None),
            Err(ClassifyError::NotReady(NotReadyReason::ModelLoading))
        ));
    }

    #[test]
    fn remote_needs_only_an_image() {
        let d = dispatcher();
        assert!(matches!(d.ensure_ready(PredictionPath::Remote, None), Err(ClassifyError::NoImage)));
        let img = upload_image(vec![1, 2], "image/png").unwrap();
        assert!(d.ensure_ready(PredictionPath::Remote, Some(&img)).is_ok());
        assert_eq!(d.remote().endpoint(), "http://127.0.0.1:9/predict");
    }

    #[test]
    fn refused_local_attempt_keeps_remote_request_alive() {
        let d = dispatcher();
        let mut session = Session::new();
        session.acquire(upload_image(vec![1, 2], "image/png").unwrap());
        let (token, _image) = session.begin(PredictionPath::Remote);

        assert!(d.ensure_ready(PredictionPath::Local, session.image()).is_err());
        assert_eq!(session.pending(), Some(PredictionPath::Remote));

        let result = PredictionResult {
            prediction: Prediction::Class(crate::severity::SeverityLevel::Mild),
            source: PredictionSource::Remote,
            scores: None,
        };
        assert!(matches!(session.complete(token, Ok(result)), Completion::Applied));
        assert!(!session.is_loading());
        assert!(session.result().is_some());
    }
}
