//! Trainable parameter tensors and the Adam optimizer.

use ndarray::{Array, Array2, Dimension, ShapeBuilder, Zip};
use rand::Rng;

/// A parameter tensor with its gradient and Adam moment estimates.
#[derive(Debug, Clone)]
pub struct Param<D: Dimension> {
    pub value: Array<f64, D>,
    pub grad: Array<f64, D>,
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> Param<D> {
    pub fn zeros<Sh: ShapeBuilder<Dim = D>>(shape: Sh) -> Self {
        Self::from_values(Array::zeros(shape))
    }

    pub fn from_values(value: Array<f64, D>) -> Self {
        let zeros = Array::zeros(value.raw_dim());
        Self {
            grad: zeros.clone(),
            m: zeros.clone(),
            v: zeros,
            value,
        }
    }
}

impl Param<ndarray::Ix2> {
    /// Glorot-uniform initialization for a `rows × cols` kernel applied to
    /// `cols` inputs.
    pub fn glorot<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (rows + cols).max(1) as f64).sqrt();
        Self::from_values(Array2::from_shape_simple_fn((rows, cols), || {
            rng.gen_range(-limit..limit)
        }))
    }
}

/// Bias-corrected Adam coefficients for one optimizer step.
#[derive(Debug, Clone, Copy)]
pub struct AdamStep {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    correction1: f64,
    correction2: f64,
}

/// Uniform access to parameters of any rank.
pub trait Trainable {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn zero_grad(&mut self);

    fn apply_adam(&mut self, step: &AdamStep);

    /// Element `index` in logical (row-major) order.
    fn value_mut(&mut self, index: usize) -> Option<&mut f64>;

    fn grad_at(&self, index: usize) -> Option<f64>;
}

impl<D: Dimension> Trainable for Param<D> {
    fn len(&self) -> usize {
        self.value.len()
    }

    fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }

    fn apply_adam(&mut self, step: &AdamStep) {
        Zip::from(&mut self.value)
            .and(&self.grad)
            .and(&mut self.m)
            .and(&mut self.v)
            .for_each(|w, &g, m, v| {
                *m = step.beta1 * *m + (1.0 - step.beta1) * g;
                *v = step.beta2 * *v + (1.0 - step.beta2) * g * g;
                let m_hat = *m / step.correction1;
                let v_hat = *v / step.correction2;
                *w -= step.learning_rate * m_hat / (v_hat.sqrt() + step.epsilon);
            });
    }

    fn value_mut(&mut self, index: usize) -> Option<&mut f64> {
        self.value.iter_mut().nth(index)
    }

    fn grad_at(&self, index: usize) -> Option<f64> {
        self.grad.iter().nth(index).copied()
    }
}

/// Adam with bias correction.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Apply one update to every parameter from its accumulated gradient.
    pub fn step(&mut self, params: &mut [&mut dyn Trainable]) {
        self.step = self.step.saturating_add(1);
        let step = AdamStep {
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            correction1: 1.0 - self.beta1.powi(self.step),
            correction2: 1.0 - self.beta2.powi(self.step),
        };
        for param in params.iter_mut() {
            param.apply_adam(&step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array1};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_glorot_within_limit() {
        let mut rng = StdRng::seed_from_u64(0);
        let p = Param::glorot(30, 10, &mut rng);
        let limit = (6.0f64 / 40.0).sqrt();
        assert_eq!(p.value.dim(), (30, 10));
        assert_eq!(p.len(), 300);
        assert!(p.value.iter().all(|w| w.abs() <= limit));
        assert!(p.grad.iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_adam_minimizes_quadratic() {
        // f(x) = (x - 3)^2
        let mut x = Param::from_values(arr1(&[0.0]));
        let mut adam = Adam::new(0.1);
        for _ in 0..500 {
            x.grad[0] = 2.0 * (x.value[0] - 3.0);
            adam.step(&mut [&mut x as &mut dyn Trainable]);
        }
        assert!((x.value[0] - 3.0).abs() < 5e-2, "x = {}", x.value[0]);
    }

    #[test]
    fn test_adam_zero_gradient_is_noop() {
        let mut x = Param::from_values(arr1(&[1.5, -2.0]));
        let mut adam = Adam::new(0.01);
        adam.step(&mut [&mut x as &mut dyn Trainable]);
        assert_eq!(x.value, arr1(&[1.5, -2.0]));
    }

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut x: Param<ndarray::Ix1> = Param::zeros(1);
        x.grad[0] = 4.0;
        let mut adam = Adam::new(0.01);
        adam.step(&mut [&mut x as &mut dyn Trainable]);
        assert!((x.value[0] + 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_flat_access_is_row_major() {
        let mut p = Param::from_values(Array2::from_shape_fn((2, 3), |(r, c)| (r * 3 + c) as f64));
        assert_eq!(p.value_mut(4).copied(), Some(4.0));
        assert_eq!(p.value_mut(6), None);

        p.grad[[1, 0]] = 7.0;
        assert_eq!(p.grad_at(3), Some(7.0));
        p.zero_grad();
        assert_eq!(p.grad, Array2::<f64>::zeros((2, 3)));

        let empty: Param<ndarray::Ix1> = Param::from_values(Array1::zeros(0));
        assert!(empty.is_empty());
    }
}
