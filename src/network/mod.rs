pub mod bundle;
pub mod metadata;
pub mod network;
pub mod topology;

pub use bundle::{save_bundle, ModelSource, MANIFEST_FILE};
pub use metadata::ModelMetadata;
pub use network::{ModelHandle, Network};
pub use topology::{LayerSpec, ModelTopology, WeightEntry, WeightGroup};
