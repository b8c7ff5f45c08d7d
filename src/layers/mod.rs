pub mod dense;
pub mod pooling;

pub use dense::Dense;

use crate::error::ModelError;

/// Shape of the activations flowing between layers (batch axis excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Height × width × channels, channels fastest.
    Spatial { height: usize, width: usize, channels: usize },
    Flat(usize),
}

impl Shape {
    /// Number of values, or a topology error if it does not fit in `usize`.
    pub fn len(&self) -> Result<usize, ModelError> {
        match *self {
            Shape::Spatial { height, width, channels } => height
                .checked_mul(width)
                .and_then(|hw| hw.checked_mul(channels))
                .ok_or_else(|| {
                    ModelError::Topology(format!("shape {}x{}x{} is too large", height, width, channels))
                }),
            Shape::Flat(n) => Ok(n),
        }
    }
}

/// One inference layer of a loaded network.
#[derive(Debug, Clone)]
pub enum Layer {
    Flatten,
    GlobalAveragePooling2D,
    Dense(Dense),
}

impl Layer {
    /// Output shape for `input`, or a topology error if the layer cannot
    /// consume it.
    pub fn output_shape(&self, input: Shape) -> Result<Shape, ModelError> {
        match (self, input) {
            (Layer::Flatten, shape) => Ok(Shape::Flat(shape.len()?)),
            (Layer::GlobalAveragePooling2D, Shape::Spatial { channels, .. }) => Ok(Shape::Flat(channels)),
            (Layer::GlobalAveragePooling2D, Shape::Flat(_)) => Err(ModelError::Topology(
                "global_average_pooling2d needs a spatial input".to_owned(),
            )),
            (Layer::Dense(d), Shape::Flat(n)) if n == d.input_size() => Ok(Shape::Flat(d.size)),
            (Layer::Dense(d), Shape::Flat(n)) => Err(ModelError::Topology(format!(
                "dense layer expects {} inputs, previous layer yields {}",
                d.input_size(),
                n
            ))),
            (Layer::Dense(_), Shape::Spatial { .. }) => Err(ModelError::Topology(
                "dense layer needs a flat input; add a flatten layer".to_owned(),
            )),
        }
    }

    /// Runs the layer. `shape` must be the shape already validated by
    /// `output_shape`.
    pub fn forward(&self, input: Vec<f64>, shape: Shape) -> Vec<f64> {
        match (self, shape) {
            (Layer::Flatten, _) => input,
            (Layer::GlobalAveragePooling2D, Shape::Spatial { height, width, channels }) => {
                pooling::global_average_pool(&input, height, width, channels)
            }
            (Layer::GlobalAveragePooling2D, Shape::Flat(_)) => input,
            (Layer::Dense(d), _) => d.feed_from(&input),
        }
    }
}
