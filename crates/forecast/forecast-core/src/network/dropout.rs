//! Inverted dropout masks.

use ndarray::{Array, Dimension, ShapeBuilder};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dropout {
    rate: f64,
}

impl Dropout {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 0.999),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Sample a mask of multipliers: `0` for dropped units and
    /// `1 / (1 - rate)` for kept ones, so the expected activation is unchanged.
    pub fn mask<Sh, D, R>(&self, shape: Sh, rng: &mut R) -> Array<f64, D>
    where
        Sh: ShapeBuilder<Dim = D>,
        D: Dimension,
        R: Rng + ?Sized,
    {
        if self.rate == 0.0 {
            return Array::ones(shape);
        }
        let keep = 1.0 / (1.0 - self.rate);
        let rate = self.rate;
        Array::from_shape_simple_fn(shape, || if rng.gen::<f64>() < rate { 0.0 } else { keep })
    }
}
