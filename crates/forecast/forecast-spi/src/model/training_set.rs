//! Supervised (window, target) pairs.

/// Training examples built from a normalized series.
///
/// `inputs[i]` holds `lookback` consecutive values and `targets[i]` the value
/// that followed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub inputs: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Window length, or zero for an empty set.
    pub fn lookback(&self) -> usize {
        self.inputs.first().map_or(0, Vec::len)
    }
}
