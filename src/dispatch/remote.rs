use log::{info, warn};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::acquisition::ImageSource;
use crate::error::{ClassifyError, RemoteFailure};
use crate::severity::SeverityLevel;
use crate::dispatch::prediction::{Prediction, PredictionResult, PredictionSource};

/// Multipart field the prediction service reads the image from.
pub const FILE_FIELD: &str = "file";

/// Response body of the prediction service.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    prediction: serde_json::Number,
}

/// Classification delegated to the remote `/predict` endpoint.
#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteClassifier {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> RemoteClassifier {
        RemoteClassifier { client, endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Uploads `image` in a single POST. No retry; the transport's default
    /// timeout applies. Every failure is `RemoteRejected`.
    pub async fn classify(&self, image: Option<&ImageSource>) -> Result<PredictionResult, ClassifyError> {
        let image = image.ok_or(ClassifyError::NoImage)?;
        let prediction = self.post(image).await.map_err(|failure| {
            warn!("remote prediction failed: {}", failure);
            ClassifyError::RemoteRejected(failure)
        })?;
        info!("remote prediction: {}", prediction.display_value());
        Ok(PredictionResult { prediction, source: PredictionSource::Remote, scores: None })
    }

    async fn post(&self, image: &ImageSource) -> Result<Prediction, RemoteFailure> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name())
            .mime_str(image.mime())
            .map_err(|e| RemoteFailure::Transport(e.to_string()))?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RemoteFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteFailure::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(|e| RemoteFailure::Transport(e.to_string()))?;
        parse_prediction(&body)
    }
}

/// Maps a `{"prediction": ...}` body onto a prediction.
///
/// JSON integers are class indices and must name one of the four levels;
/// JSON floats are continuous scores.
pub fn parse_prediction(body: &[u8]) -> Result<Prediction, RemoteFailure> {
    let parsed: PredictResponse =
        serde_json::from_slice(body).map_err(|e| RemoteFailure::MalformedBody(e.to_string()))?;
    let n = parsed.prediction;
    if n.is_f64() {
        return n
            .as_f64()
            .map(Prediction::Score)
            .ok_or_else(|| RemoteFailure::MalformedBody(format!("unreadable score {}", n)));
    }
    n.as_u64()
        .and_then(|i| usize::try_from(i).ok())
        .and_then(SeverityLevel::from_index)
        .map(Prediction::Class)
        .ok_or_else(|| RemoteFailure::MalformedBody(format!("class index {} out of range", n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_prediction_is_a_class() {
        assert_eq!(
            parse_prediction(br#"{"prediction": 2}"#).unwrap(),
            Prediction::Class(SeverityLevel::Moderate)
        );
        assert_eq!(
            parse_prediction(br#"{"prediction": 0, "extra": true}"#).unwrap(),
            Prediction::Class(SeverityLevel::ExtremelyMild)
        );
    }

    #[test]
    fn float_prediction_is_a_score() {
        let p = parse_prediction(br#"{"prediction": 1.456}"#).unwrap();
        assert_eq!(p, Prediction::Score(1.456));
        assert_eq!(p.display_value(), "1.46");
    }

    #[test]
    fn out_of_range_index_fails_closed() {
        assert!(matches!(parse_prediction(br#"{"prediction": 4}"#), Err(RemoteFailure::MalformedBody(_))));
        assert!(matches!(parse_prediction(br#"{"prediction": -1}"#), Err(RemoteFailure::MalformedBody(_))));
    }

    #[test]
    fn malformed_bodies_fail_closed() {
        let bodies: [&[u8]; 4] = [b"not json", br#"{}"#, br#"{"prediction": "Mild"}"#, br#"{"prediction": null}"#];
        for body in bodies {
            assert!(matches!(parse_prediction(body), Err(RemoteFailure::MalformedBody(_))));
        }
    }

    #[tokio::test]
    async fn missing_image_is_no_image() {
        let remote = RemoteClassifier::new(reqwest::Client::new(), "http://127.0.0.1:9/predict");
        assert!(matches!(remote.classify(None).await, Err(ClassifyError::NoImage)));
    }
}
