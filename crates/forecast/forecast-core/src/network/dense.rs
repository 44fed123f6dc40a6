//! Fully connected layer.

use super::param::{Param, Trainable};
use ndarray::{Array1, Axis, Ix1, Ix2};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Linear,
    Relu,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
        }
    }

    fn derivative(self, pre: f64) -> f64 {
        match self {
            Activation::Linear => 1.0,
            Activation::Relu => {
                if pre > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dense {
    activation: Activation,
    /// `units × inputs`
    kernel: Param<Ix2>,
    bias: Param<Ix1>,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        units: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        Self {
            activation,
            kernel: Param::glorot(units, inputs, rng),
            bias: Param::zeros(units),
        }
    }

    pub fn units(&self) -> usize {
        self.kernel.value.nrows()
    }

    /// Returns `(pre_activation, output)`.
    pub fn forward(&self, x: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let pre = self.kernel.value.dot(x) + &self.bias.value;
        let activation = self.activation;
        let out = pre.mapv(|p| activation.apply(p));
        (pre, out)
    }

    /// Accumulate gradients and return the gradient with respect to `x`.
    pub fn backward(
        &mut self,
        x: &Array1<f64>,
        pre: &Array1<f64>,
        d_out: &Array1<f64>,
    ) -> Array1<f64> {
        let activation = self.activation;
        let d = d_out * &pre.mapv(|p| activation.derivative(p));

        self.kernel.grad += &d
            .view()
            .insert_axis(Axis(1))
            .dot(&x.view().insert_axis(Axis(0)));
        self.bias.grad += &d;
        self.kernel.value.t().dot(&d)
    }

    pub fn params_mut(&mut self) -> [&mut dyn Trainable; 2] {
        [&mut self.kernel, &mut self.bias]
    }

    pub fn parameter_count(&self) -> usize {
        self.kernel.len() + self.bias.len()
    }
}
