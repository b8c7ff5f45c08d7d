use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer: `a = activation(x · W + b)`.
#[derive(Debug, Clone)]
pub struct Dense {
    pub size: usize,
    /// Shape (input_size, size).
    pub weights: Matrix,
    /// Shape (1, size).
    pub biases: Matrix,
    pub activator: ActivationFunction,
}

impl Dense {
    /// Returns `None` when the bias length does not match the kernel width.
    pub fn new(weights: Matrix, biases: Vec<f64>, activation: ActivationFunction) -> Option<Dense> {
        if biases.len() != weights.cols {
            return None;
        }
        Some(Dense {
            size: weights.cols,
            biases: Matrix::row(&biases),
            weights,
            activator: activation,
        })
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Caller guarantees `input.len() == self.input_size()`.
    pub fn feed_from(&self, input: &[f64]) -> Vec<f64> {
        let z = &(&Matrix::row(input) * &self.weights) + &self.biases;
        self.activator.apply(&z.data[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_dense_is_affine() {
        let w = Matrix::from_data(vec![vec![1.0, -1.0], vec![2.0, 0.0]]);
        let layer = Dense::new(w, vec![0.5, 0.25], ActivationFunction::Identity).unwrap();
        assert_eq!(layer.input_size(), 2);
        assert_eq!(layer.feed_from(&[1.0, 1.0]), vec![3.5, -0.75]);
    }

    #[test]
    fn bias_width_must_match() {
        let w = Matrix::zeros(3, 4);
        assert!(Dense::new(w, vec![0.0; 3], ActivationFunction::ReLU).is_none());
    }
}
