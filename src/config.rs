use crate::network::ModelSource;

/// Backend used when no URL is configured at build or run time.
pub const FALLBACK_BACKEND_URL: &str = "https://acne-ai-backend.onrender.com";

/// Environment variable naming the backend base URL.
pub const BACKEND_URL_ENV: &str = "ACNE_BACKEND_URL";

/// Backend base URL baked in at build time from `ACNE_BACKEND_URL`, or the
/// fallback. Binaries let the same variable override it at run time.
pub const BUILD_BACKEND_URL: &str = match option_env!("ACNE_BACKEND_URL") {
    Some(url) => url,
    None => FALLBACK_BACKEND_URL,
};

/// Default location of the model bundle.
pub const DEFAULT_MODEL_LOCATION: &str = "public/models";

/// Image file the studio's snapshot camera reads frames from.
pub const DEFAULT_CAMERA_SNAPSHOT: &str = "camera/frame.jpg";

/// Path of the prediction route on the backend.
pub const PREDICT_PATH: &str = "/predict";

/// Settings shared by both binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub backend_url: String,
    pub model: ModelSource,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            backend_url: BUILD_BACKEND_URL.to_owned(),
            model: ModelSource::parse(DEFAULT_MODEL_LOCATION),
        }
    }
}

impl ClassifierConfig {
    pub fn new(backend_url: &str, model_location: &str) -> ClassifierConfig {
        ClassifierConfig {
            backend_url: backend_url.trim().to_owned(),
            model: ModelSource::parse(model_location),
        }
    }

    /// `{backend_url}/predict`, tolerating a trailing slash on the base.
    pub fn predict_endpoint(&self) -> String {
        format!("{}{}", self.backend_url.trim_end_matches('/'), PREDICT_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let cfg = ClassifierConfig::new("http://localhost:8000/", "public/models");
        assert_eq!(cfg.predict_endpoint(), "http://localhost:8000/predict");
        let cfg = ClassifierConfig::new("https://api.example.com/v1", "public/models");
        assert_eq!(cfg.predict_endpoint(), "https://api.example.com/v1/predict");
    }

    #[test]
    fn default_points_at_bundled_models() {
        let cfg = ClassifierConfig::default();
        assert_eq!(cfg.model, ModelSource::parse("public/models"));
        assert!(!cfg.backend_url.is_empty());
    }
}
