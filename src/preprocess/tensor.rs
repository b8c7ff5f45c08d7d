/// A single image ready for the model: shape `[1, height, width, 3]`,
/// channels fastest, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTensor {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl PreparedTensor {
    /// Wraps HWC values and prepends the batch dimension.
    pub(crate) fn batched(height: usize, width: usize, channels: usize, data: Vec<f32>) -> PreparedTensor {
        debug_assert_eq!(data.len(), height * width * channels);
        PreparedTensor { shape: [1, height, width, channels], data }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    /// Values of the single batch entry, row-major HWC.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Value at pixel (`y`, `x`), channel `c` of the batch entry.
    pub fn get(&self, y: usize, x: usize, c: usize) -> Option<f32> {
        let [_, h, w, ch] = self.shape;
        if y >= h || x >= w || c >= ch {
            return None;
        }
        self.data.get((y * w + x) * ch + c).copied()
    }
}
