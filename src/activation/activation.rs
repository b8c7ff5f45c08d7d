use serde::{Serialize, Deserialize};
use std::f64::consts::{E, PI};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Vector-valued; only meaningful through `apply()`.
    Softmax,
    Tanh,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

impl ActivationFunction {
    /// Applies the activation to a full pre-activation vector `z`.
    pub fn apply(&self, z: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => softmax(z),
            _ => z.iter().map(|&x| self.function(x)).collect(),
        }
    }

    /// Element-wise activation. `Softmax` passes values through unchanged
    /// here; use `apply()` for it.
    fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { x } else { alpha * (E.powf(x) - 1.0) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x / (1.0 + E.powf(-x)),
        }
    }
}

/// Numerically stable softmax (max subtracted before exponentiation).
fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_and_keeps_order() {
        let out = ActivationFunction::Softmax.apply(&[1.0, 3.0, 2.0, 0.0]);
        let total: f64 = out.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(out[1] > out[2] && out[2] > out[0] && out[0] > out[3]);
    }

    #[test]
    fn softmax_of_equal_logits_is_uniform() {
        let out = ActivationFunction::Softmax.apply(&[0.0; 4]);
        assert!(out.iter().all(|&p| (p - 0.25).abs() < 1e-12));
    }

    #[test]
    fn relu_clamps_negatives() {
        assert_eq!(ActivationFunction::ReLU.apply(&[-1.0, 0.5]), vec![0.0, 0.5]);
    }

    #[test]
    fn manifest_names_are_stable() {
        let json = serde_json::to_string(&ActivationFunction::LeakyReLU { alpha: 0.1 }).unwrap();
        assert_eq!(json, r#"{"LeakyReLU":{"alpha":0.1}}"#);
        let parsed: ActivationFunction = serde_json::from_str(r#""Softmax""#).unwrap();
        assert_eq!(parsed, ActivationFunction::Softmax);
    }
}
