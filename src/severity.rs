use serde::{Deserialize, Serialize};
use std::fmt;

/// The four ordered acne severity classes, indexed as the model's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    ExtremelyMild,
    Mild,
    Moderate,
    Severe,
}

impl SeverityLevel {
    /// Number of classes; also the required width of the model's output layer.
    pub const COUNT: usize = 4;

    pub const ALL: [SeverityLevel; SeverityLevel::COUNT] = [
        SeverityLevel::ExtremelyMild,
        SeverityLevel::Mild,
        SeverityLevel::Moderate,
        SeverityLevel::Severe,
    ];

    pub fn from_index(index: usize) -> Option<SeverityLevel> {
        SeverityLevel::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityLevel::ExtremelyMild => "Extremely Mild",
            SeverityLevel::Mild => "Mild",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::Severe => "Severe",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Index of the highest score.
///
/// Ties resolve to the lowest index. NaN never wins; `None` when `scores` is
/// empty or holds only NaN.
pub fn argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if s.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_maps_to_a_label() {
        let labels: Vec<&str> = (0..SeverityLevel::COUNT)
            .map(|i| SeverityLevel::from_index(i).unwrap().label())
            .collect();
        assert_eq!(labels, ["Extremely Mild", "Mild", "Moderate", "Severe"]);
        assert_eq!(SeverityLevel::from_index(4), None);
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        for pair in SeverityLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].index() + 1, pair[1].index());
        }
    }

    #[test]
    fn argmax_prefers_first_of_equal_scores() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(argmax(&[0.25, 0.25, 0.25, 0.25]), Some(0));
    }

    #[test]
    fn argmax_skips_nan() {
        assert_eq!(argmax(&[f64::NAN, 0.2, 0.7, 0.1]), Some(2));
        assert_eq!(argmax(&[f64::NAN, f64::NAN]), None);
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn argmax_handles_negative_scores() {
        assert_eq!(argmax(&[-3.0, -1.5, -2.0, -9.0]), Some(1));
    }
}
