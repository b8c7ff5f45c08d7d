use std::sync::Arc;

use crate::error::ModelError;
use crate::layers::{Dense, Layer, Shape};
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::network::topology::{LayerSpec, ModelTopology, WeightEntry, WeightGroup, LAYERS_MODEL_FORMAT};

/// Shared, read-only handle to a loaded network.
pub type ModelHandle = Arc<Network>;

/// A loaded inference network. Immutable once built, so one instance can
/// serve any number of concurrent forward passes.
#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    pub layers: Vec<Layer>,
    pub metadata: ModelMetadata,
    input_shape: [usize; 3],
    output_size: usize,
}

impl Network {
    /// Builds a network, checking that every layer accepts the shape
    /// produced by the one before it.
    pub fn new(
        name: impl Into<String>,
        input_shape: [usize; 3],
        layers: Vec<Layer>,
        metadata: ModelMetadata,
    ) -> Result<Network, ModelError> {
        let mut shape = spatial(input_shape);
        for layer in &layers {
            shape = layer.output_shape(shape)?;
        }
        let output_size = match shape {
            Shape::Flat(n) => n,
            Shape::Spatial { .. } => {
                return Err(ModelError::Topology("network output must be flat".to_owned()))
            }
        };
        Ok(Network {
            name: name.into(),
            layers,
            metadata,
            input_shape,
            output_size,
        })
    }

    pub fn input_shape(&self) -> [usize; 3] {
        self.input_shape
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Forward pass over one HWC image (batch dimension stripped).
    pub fn forward(&self, input: &[f32]) -> Result<Vec<f64>, ModelError> {
        let mut shape = spatial(self.input_shape);
        let expected = shape.len()?;
        if input.len() != expected {
            return Err(ModelError::InputLength { expected, actual: input.len() });
        }
        let mut current: Vec<f64> = input.iter().map(|&v| v as f64).collect();
        for layer in &self.layers {
            let next_shape = layer.output_shape(shape)?;
            current = layer.forward(current, shape);
            shape = next_shape;
        }
        Ok(current)
    }

    /// Assembles a network from a parsed manifest and the concatenated
    /// shard values.
    pub fn from_topology(topology: &ModelTopology, weights: &[f32]) -> Result<Network, ModelError> {
        let mut expected = 0usize;
        for entry in topology.weight_entries() {
            expected = expected.checked_add(entry.len()?).ok_or_else(|| {
                ModelError::Topology("weights manifest declares too many values".to_owned())
            })?;
        }
        if expected != weights.len() {
            return Err(ModelError::WeightCount { expected, actual: weights.len() });
        }

        let mut reader = WeightReader { entries: topology.weight_entries(), values: weights, cursor: 0 };

        let mut shape = spatial(topology.input_shape);
        let mut layers = Vec::with_capacity(topology.layers.len());
        for spec in &topology.layers {
            let layer = match spec {
                LayerSpec::Flatten => Layer::Flatten,
                LayerSpec::GlobalAveragePooling2d => Layer::GlobalAveragePooling2D,
                LayerSpec::Dense { units, activation } => {
                    let input_size = match shape {
                        Shape::Flat(n) => n,
                        Shape::Spatial { .. } => {
                            return Err(ModelError::Topology(
                                "dense layer needs a flat input; add a flatten layer".to_owned(),
                            ))
                        }
                    };
                    let kernel = reader.take(&[input_size, *units])?;
                    let weights = Matrix::from_row_major(input_size, *units, kernel)
                        .ok_or_else(|| ModelError::Topology("kernel size mismatch".to_owned()))?;
                    let bias = reader.take(&[*units])?.iter().map(|&v| v as f64).collect();
                    let dense = Dense::new(weights, bias, activation.clone())
                        .ok_or_else(|| ModelError::Topology("bias size mismatch".to_owned()))?;
                    Layer::Dense(dense)
                }
            };
            shape = layer.output_shape(shape)?;
            layers.push(layer);
        }

        if reader.entries.next().is_some() {
            return Err(ModelError::Topology(
                "weights manifest declares tensors no layer consumes".to_owned(),
            ));
        }

        Network::new(
            topology.name.clone(),
            topology.input_shape,
            layers,
            topology.metadata.clone().unwrap_or_default(),
        )
    }

    /// Inverse of `from_topology`: the manifest plus one shard's worth of
    /// values, all placed in `shard_name`.
    pub fn to_topology(&self, shard_name: &str) -> (ModelTopology, Vec<f32>) {
        let mut specs = Vec::with_capacity(self.layers.len());
        let mut entries = Vec::new();
        let mut values = Vec::new();
        for (i, layer) in self.layers.iter().enumerate() {
            match layer {
                Layer::Flatten => specs.push(LayerSpec::Flatten),
                Layer::GlobalAveragePooling2D => specs.push(LayerSpec::GlobalAveragePooling2d),
                Layer::Dense(d) => {
                    specs.push(LayerSpec::Dense { units: d.size, activation: d.activator.clone() });
                    entries.push(WeightEntry {
                        name: format!("dense_{}/kernel", i),
                        shape: vec![d.input_size(), d.size],
                    });
                    entries.push(WeightEntry { name: format!("dense_{}/bias", i), shape: vec![d.size] });
                    values.extend(d.weights.to_row_major());
                    values.extend(d.biases.to_row_major());
                }
            }
        }
        let topology = ModelTopology {
            format: LAYERS_MODEL_FORMAT.to_owned(),
            name: self.name.clone(),
            input_shape: self.input_shape,
            layers: specs,
            weights_manifest: vec![WeightGroup { paths: vec![shard_name.to_owned()], weights: entries }],
            metadata: Some(self.metadata.clone()),
        };
        (topology, values)
    }
}

/// Hands out manifest tensors in order, checking each against the shape the
/// consuming layer needs.
struct WeightReader<'a, I> {
    entries: I,
    values: &'a [f32],
    cursor: usize,
}

impl<'a, I> WeightReader<'a, I>
where
    I: Iterator<Item = &'a WeightEntry>,
{
    fn take(&mut self, want: &[usize]) -> Result<&'a [f32], ModelError> {
        let entry = self.entries.next().ok_or_else(|| {
            ModelError::Topology(format!("weights manifest is missing a {:?} tensor", want))
        })?;
        if entry.shape != want {
            return Err(ModelError::Topology(format!(
                "weight {} has shape {:?}, layer needs {:?}",
                entry.name, entry.shape, want
            )));
        }
        let len = entry.len()?;
        let values = self.values.get(self.cursor..self.cursor + len).ok_or_else(|| {
            ModelError::Topology(format!("weight {} runs past the end of the shards", entry.name))
        })?;
        self.cursor += len;
        Ok(values)
    }
}

fn spatial(shape: [usize; 3]) -> Shape {
    Shape::Spatial { height: shape[0], width: shape[1], channels: shape[2] }
}
