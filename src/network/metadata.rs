use serde::{Deserialize, Serialize};

/// Optional annotations stored alongside a model's topology.
/// All fields are Option<> so bundles without metadata deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelMetadata {
    pub description: Option<String>,
}
