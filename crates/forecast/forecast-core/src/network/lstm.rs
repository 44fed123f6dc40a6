//! Long short-term memory layer with backpropagation through time.
//!
//! Gate layout follows the usual `[input, forget, cell, output]` order in a
//! single `4·units` pre-activation vector.

use super::param::{Param, Trainable};
use ndarray::{s, Array1, Array2, ArrayView1, Axis, Ix1, Ix2};
use rand::Rng;

/// Cached activations of one time step, kept for the backward pass.
#[derive(Debug, Clone)]
pub struct LstmStep {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    /// Activated gates `[i, f, g, o]`
    gates: Array1<f64>,
    tanh_c: Array1<f64>,
    pub h: Array1<f64>,
}

impl LstmStep {
    fn gate(&self, index: usize) -> ArrayView1<'_, f64> {
        let units = self.h.len();
        self.gates.slice(s![index * units..(index + 1) * units])
    }
}

#[derive(Debug, Clone)]
pub struct LstmLayer {
    units: usize,
    /// `4·units × input_size`
    kernel: Param<Ix2>,
    /// `4·units × units`
    recurrent: Param<Ix2>,
    bias: Param<Ix1>,
}

impl LstmLayer {
    pub fn new<R: Rng + ?Sized>(input_size: usize, units: usize, rng: &mut R) -> Self {
        let rows = 4 * units;
        let kernel = Param::glorot(rows, input_size, rng);
        let recurrent = Param::glorot(rows, units, rng);

        // Forget gate starts open.
        let mut bias = Param::zeros(rows);
        bias.value.slice_mut(s![units..2 * units]).fill(1.0);

        Self {
            units,
            kernel,
            recurrent,
            bias,
        }
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn input_size(&self) -> usize {
        self.kernel.value.ncols()
    }

    /// Run the layer over a `time × input_size` sequence from a zero state.
    pub fn forward(&self, inputs: &Array2<f64>) -> Vec<LstmStep> {
        let units = self.units;
        let mut h = Array1::<f64>::zeros(units);
        let mut c = Array1::<f64>::zeros(units);
        let mut steps = Vec::with_capacity(inputs.nrows());

        for x in inputs.rows() {
            let mut gates =
                self.kernel.value.dot(&x) + self.recurrent.value.dot(&h) + &self.bias.value;
            gates.slice_mut(s![..2 * units]).mapv_inplace(sigmoid);
            gates.slice_mut(s![2 * units..3 * units]).mapv_inplace(f64::tanh);
            gates.slice_mut(s![3 * units..]).mapv_inplace(sigmoid);

            let i = gates.slice(s![..units]);
            let f = gates.slice(s![units..2 * units]);
            let g = gates.slice(s![2 * units..3 * units]);
            let o = gates.slice(s![3 * units..]);

            let c_next = &f * &c + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            steps.push(LstmStep {
                x: x.to_owned(),
                h_prev: std::mem::replace(&mut h, h_next.clone()),
                c_prev: std::mem::replace(&mut c, c_next),
                gates,
                tanh_c,
                h: h_next,
            });
        }

        steps
    }

    /// Accumulate parameter gradients for one sequence.
    ///
    /// Row `t` of `dh_ext` is the loss gradient flowing into `h_t` from
    /// above. Returns the gradient with respect to every input row `x_t`.
    pub fn backward(&mut self, steps: &[LstmStep], dh_ext: &Array2<f64>) -> Array2<f64> {
        let units = self.units;
        let mut dh_next = Array1::<f64>::zeros(units);
        let mut dc_next = Array1::<f64>::zeros(units);
        let mut dxs = Array2::zeros((steps.len(), self.input_size()));
        let mut dz = Array1::<f64>::zeros(4 * units);

        for (t, step) in steps.iter().enumerate().rev() {
            let (i, f, g, o) = (step.gate(0), step.gate(1), step.gate(2), step.gate(3));

            let dh = &dh_ext.row(t) + &dh_next;
            let dc = &dh * &o * &step.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;

            dz.slice_mut(s![..units])
                .assign(&(&dc * &g * &i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![units..2 * units])
                .assign(&(&dc * &step.c_prev * &f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![2 * units..3 * units])
                .assign(&(&dc * &i * &g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![3 * units..])
                .assign(&(&dh * &step.tanh_c * &o.mapv(|v| v * (1.0 - v))));
            dc_next = &dc * &f;

            let dz_col = dz.view().insert_axis(Axis(1));
            self.kernel.grad += &dz_col.dot(&step.x.view().insert_axis(Axis(0)));
            self.recurrent.grad += &dz_col.dot(&step.h_prev.view().insert_axis(Axis(0)));
            self.bias.grad += &dz;

            dxs.row_mut(t).assign(&self.kernel.value.t().dot(&dz));
            dh_next = self.recurrent.value.t().dot(&dz);
        }

        dxs
    }

    pub fn params_mut(&mut self) -> [&mut dyn Trainable; 3] {
        [&mut self.kernel, &mut self.recurrent, &mut self.bias]
    }

    pub fn parameter_count(&self) -> usize {
        self.kernel.len() + self.recurrent.len() + self.bias.len()
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parameter_count() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = LstmLayer::new(1, 64, &mut rng);
        // 4 * (units * (input + units) + units)
        assert_eq!(layer.parameter_count(), 4 * (64 * (1 + 64) + 64));
        assert_eq!(layer.kernel.value.dim(), (256, 1));
        assert_eq!(layer.recurrent.value.dim(), (256, 64));
    }

    #[test]
    fn test_forget_bias_initialized_to_one() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = LstmLayer::new(2, 3, &mut rng);
        assert_eq!(layer.bias.value.slice(s![0..3]).to_vec(), vec![0.0; 3]);
        assert_eq!(layer.bias.value.slice(s![3..6]).to_vec(), vec![1.0; 3]);
        assert_eq!(layer.bias.value.slice(s![6..12]).to_vec(), vec![0.0; 6]);
    }

    #[test]
    fn test_zero_input_gives_zero_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = LstmLayer::new(1, 4, &mut rng);
        let steps = layer.forward(&Array2::zeros((5, 1)));
        assert_eq!(steps.len(), 5);
        for step in &steps {
            assert!(step.h.iter().all(|h| *h == 0.0));
        }
    }

    #[test]
    fn test_hidden_state_bounded() {
        let mut rng = StdRng::seed_from_u64(2);
        let layer = LstmLayer::new(1, 8, &mut rng);
        let inputs = Array2::from_shape_fn((20, 1), |(i, _)| (i as f64).sin() * 50.0);
        for step in layer.forward(&inputs) {
            assert!(step.h.iter().all(|h| h.abs() < 1.0));
        }
    }

    #[test]
    fn test_backward_shapes() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = LstmLayer::new(2, 3, &mut rng);
        let inputs = arr2(&[[0.1, -0.2], [0.3, 0.4], [-0.5, 0.6]]);
        let steps = layer.forward(&inputs);
        let dx = layer.backward(&steps, &Array2::ones((3, 3)));
        assert_eq!(dx.dim(), (3, 2));
        assert!(layer.kernel.grad.iter().any(|g| *g != 0.0));
        assert!(layer.recurrent.grad.iter().any(|g| *g != 0.0));
    }
}
