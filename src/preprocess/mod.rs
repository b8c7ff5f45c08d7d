pub mod pipeline;
pub mod tensor;

pub use pipeline::{prepare, prepare_bytes, resize_nearest, INPUT_SIZE};
pub use tensor::PreparedTensor;
