use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;
use crate::error::ModelError;
use crate::network::metadata::ModelMetadata;

/// Value of the manifest's `format` field.
pub const LAYERS_MODEL_FORMAT: &str = "layers-model";

/// Describes one layer in a model manifest.
///
/// Dense layers consume two weight entries from the manifest, in order: the
/// kernel `[input_size, units]` followed by the bias `[units]`. The input
/// size is inferred from the previous layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Flatten,
    GlobalAveragePooling2d,
    Dense {
        units: usize,
        activation: ActivationFunction,
    },
}

/// A named tensor inside a weight shard group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub name: String,
    pub shape: Vec<usize>,
}

impl WeightEntry {
    /// Number of f32 values the entry occupies. A shape whose product does
    /// not fit in `usize` is a topology error.
    pub fn len(&self) -> Result<usize, ModelError> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| {
                ModelError::Topology(format!("weight {} has oversized shape {:?}", self.name, self.shape))
            })
    }
}

/// Shard files plus the tensors packed into them. The shards of a group are
/// concatenated, then the tensors are read back-to-back as little-endian f32.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightGroup {
    pub paths: Vec<String>,
    pub weights: Vec<WeightEntry>,
}

/// The `model.json` document of a model bundle: architecture, the weights
/// manifest and optional metadata. Weight values live in the shard files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTopology {
    pub format: String,
    /// Human-readable name, logged at load time.
    pub name: String,
    /// Height, width, channels of a single input image.
    pub input_shape: [usize; 3],
    /// Ordered list of layers (input → output).
    pub layers: Vec<LayerSpec>,
    pub weights_manifest: Vec<WeightGroup>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl ModelTopology {
    /// Parses and checks the format tag of a manifest.
    pub fn from_json(bytes: &[u8]) -> Result<ModelTopology, ModelError> {
        let topology: ModelTopology = serde_json::from_slice(bytes)?;
        if topology.format != LAYERS_MODEL_FORMAT {
            return Err(ModelError::Topology(format!(
                "unsupported format \"{}\", expected \"{}\"",
                topology.format, LAYERS_MODEL_FORMAT
            )));
        }
        Ok(topology)
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// All weight entries in reading order.
    pub fn weight_entries(&self) -> impl Iterator<Item = &WeightEntry> {
        self.weights_manifest.iter().flat_map(|g| g.weights.iter())
    }
}
