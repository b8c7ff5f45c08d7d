use std::sync::Arc;

use log::{debug, info};

use crate::acquisition::ImageSource;
use crate::error::{ClassifyError, ModelError, NotReadyReason};
use crate::network::{ModelHandle, ModelSource, Network};
use crate::preprocess::{prepare, INPUT_SIZE};
use crate::severity::{argmax, SeverityLevel};
use crate::dispatch::model_slot::ModelSlot;
use crate::dispatch::prediction::{Prediction, PredictionResult, PredictionSource};

/// In-process classification against the session's model.
#[derive(Debug, Clone)]
pub struct LocalClassifier {
    slot: Arc<ModelSlot>,
}

impl LocalClassifier {
    pub fn new(slot: Arc<ModelSlot>) -> LocalClassifier {
        LocalClassifier { slot }
    }

    pub fn slot(&self) -> &Arc<ModelSlot> {
        &self.slot
    }

    /// Preprocesses `image`, runs the model and maps the argmax to a
    /// severity level. Decoding and the forward pass run on the blocking
    /// pool.
    pub async fn classify(&self, image: Option<&ImageSource>) -> Result<PredictionResult, ClassifyError> {
        let model = self.slot.handle()?;
        let image = image
            .cloned()
            .ok_or(ClassifyError::NotReady(NotReadyReason::NoImage))?;

        let scores = tokio::task::spawn_blocking(move || run_model(&model, &image))
            .await
            .map_err(|e| ClassifyError::TaskAborted(e.to_string()))??;

        let index = argmax(&scores).ok_or(ClassifyError::DegenerateOutput)?;
        let level = SeverityLevel::from_index(index).ok_or(ClassifyError::DegenerateOutput)?;
        info!("local prediction: {} (index {})", level, index);
        Ok(PredictionResult {
            prediction: Prediction::Class(level),
            source: PredictionSource::Local,
            scores: Some(scores),
        })
    }
}

/// Synchronous core of the local path.
pub fn run_model(model: &Network, image: &ImageSource) -> Result<Vec<f64>, ClassifyError> {
    let tensor = prepare(image)?;
    debug!("prepared tensor {:?}", tensor.shape());
    Ok(model.forward(tensor.as_slice())?)
}

/// Loads a bundle and checks it fits the severity classifier: a
/// 224×224×3 input and one output per severity level.
pub async fn load_severity_model(source: &ModelSource, client: &reqwest::Client) -> Result<ModelHandle, ModelError> {
    info!("loading model from {}", source);
    let network = source.load(client).await?;
    let size = INPUT_SIZE as usize;
    if network.input_shape() != [size, size, 3] {
        return Err(ModelError::Topology(format!(
            "model input shape {:?}, expected [{}, {}, 3]",
            network.input_shape(),
            size,
            size
        )));
    }
    if network.output_size() != SeverityLevel::COUNT {
        return Err(ModelError::Topology(format!(
            "model has {} outputs, expected {}",
            network.output_size(),
            SeverityLevel::COUNT
        )));
    }
    Ok(Arc::new(network))
}
