use crate::severity::SeverityLevel;

/// Which path produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    Local,
    Remote,
}

impl PredictionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PredictionSource::Local => "local",
            PredictionSource::Remote => "remote",
        }
    }
}

/// A discrete severity class or, from the remote service only, a continuous
/// score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    Class(SeverityLevel),
    Score(f64),
}

impl Prediction {
    /// Label for a class, two decimals for a score.
    pub fn display_value(&self) -> String {
        match self {
            Prediction::Class(level) => level.label().to_owned(),
            Prediction::Score(score) => format!("{:.2}", score),
        }
    }
}

/// Outcome of one classification attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub prediction: Prediction,
    pub source: PredictionSource,
    /// Raw per-class model output, local path only.
    pub scores: Option<Vec<f64>>,
}

impl PredictionResult {
    pub fn severity(&self) -> Option<SeverityLevel> {
        match self.prediction {
            Prediction::Class(level) => Some(level),
            Prediction::Score(_) => None,
        }
    }
}
