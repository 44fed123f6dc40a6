//! Stacked LSTM regressor.
//!
//! Architecture (single feature per time step):
//!
//! ```text
//! window ─► LSTM(first_units, full sequence) ─► dropout
//!        ─► LSTM(second_units, final state)  ─► dropout
//!        ─► Dense(dense_units, relu) ─► Dense(1, linear)
//! ```
//!
//! Trained on mean squared error with Adam, shuffled mini-batches and a
//! trailing validation split.

mod dense;
mod dropout;
mod lstm;
mod param;

pub use dense::{Activation, Dense};
pub use dropout::Dropout;
pub use lstm::{LstmLayer, LstmStep};
pub use param::{Adam, AdamStep, Param, Trainable};

use forecast_api::NetworkConfig;
use forecast_spi::{
    CancelToken, ForecastError, Result, SequenceRegressor, TrainingOptions, TrainingReport,
    TrainingSet,
};
use ndarray::{arr1, Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;
use tracing::debug;

/// Epoch interval between loss log lines.
const LOG_EVERY_EPOCHS: usize = 10;

/// Dropout masks for one training example.
struct Masks {
    /// `lookback × first_units`
    sequence: Array2<f64>,
    last: Array1<f64>,
}

/// Activations of one forward pass.
struct Pass {
    first: Vec<LstmStep>,
    second: Vec<LstmStep>,
    second_out: Array1<f64>,
    hidden_pre: Array1<f64>,
    hidden_out: Array1<f64>,
    output_pre: Array1<f64>,
    prediction: f64,
}

#[derive(Debug, Clone)]
pub struct LstmRegressor {
    lookback: usize,
    first: LstmLayer,
    second: LstmLayer,
    hidden: Dense,
    output: Dense,
    dropout: Dropout,
    optimizer: Adam,
    rng: StdRng,
}

impl LstmRegressor {
    /// Build a freshly initialized network; `seed` makes initialization,
    /// dropout and shuffling reproducible.
    pub fn new(lookback: usize, config: &NetworkConfig, seed: Option<u64>) -> Self {
        let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        let first = LstmLayer::new(1, config.first_units, &mut rng);
        let second = LstmLayer::new(config.first_units, config.second_units, &mut rng);
        let hidden = Dense::new(
            config.second_units,
            config.dense_units,
            Activation::Relu,
            &mut rng,
        );
        let output = Dense::new(config.dense_units, 1, Activation::Linear, &mut rng);

        Self {
            lookback,
            first,
            second,
            hidden,
            output,
            dropout: Dropout::new(config.dropout),
            optimizer: Adam::new(config.learning_rate),
            rng,
        }
    }

    fn params_mut(&mut self) -> Vec<&mut dyn Trainable> {
        collect_params(
            &mut self.first,
            &mut self.second,
            &mut self.hidden,
            &mut self.output,
        )
    }

    fn apply_gradients(&mut self) {
        let Self {
            first,
            second,
            hidden,
            output,
            optimizer,
            ..
        } = self;
        optimizer.step(&mut collect_params(first, second, hidden, output));
    }

    fn zero_grad(&mut self) {
        for param in self.params_mut() {
            param.zero_grad();
        }
    }

    fn sample_masks(&mut self) -> Masks {
        let sequence = self
            .dropout
            .mask((self.lookback, self.first.units()), &mut self.rng);
        let last = self.dropout.mask(self.second.units(), &mut self.rng);
        Masks { sequence, last }
    }

    fn forward(&self, window: &[f64], masks: Option<&Masks>) -> Pass {
        let inputs = Array2::from_shape_fn((window.len(), 1), |(t, _)| window[t]);

        let first = self.first.forward(&inputs);
        let mut first_out =
            Array2::from_shape_fn((first.len(), self.first.units()), |(t, j)| first[t].h[j]);
        if let Some(m) = masks {
            first_out *= &m.sequence;
        }

        let second = self.second.forward(&first_out);
        let mut second_out = second
            .last()
            .map(|step| step.h.clone())
            .unwrap_or_else(|| Array1::zeros(self.second.units()));
        if let Some(m) = masks {
            second_out *= &m.last;
        }

        let (hidden_pre, hidden_out) = self.hidden.forward(&second_out);
        let (output_pre, output) = self.output.forward(&hidden_out);
        let prediction = output.get(0).copied().unwrap_or(0.0);

        Pass {
            first,
            second,
            second_out,
            hidden_pre,
            hidden_out,
            output_pre,
            prediction,
        }
    }

    fn backward(&mut self, pass: &Pass, masks: Option<&Masks>, d_prediction: f64) {
        let d_hidden =
            self.output
                .backward(&pass.hidden_out, &pass.output_pre, &arr1(&[d_prediction]));
        let mut d_last = self
            .hidden
            .backward(&pass.second_out, &pass.hidden_pre, &d_hidden);
        if let Some(m) = masks {
            d_last *= &m.last;
        }

        // Only the final state of the second layer feeds the dense head.
        let steps = pass.second.len();
        let mut dh_second = Array2::<f64>::zeros((steps, self.second.units()));
        if steps > 0 {
            dh_second.row_mut(steps - 1).assign(&d_last);
        }

        let mut dh_first = self.second.backward(&pass.second, &dh_second);
        if let Some(m) = masks {
            dh_first *= &m.sequence;
        }
        self.first.backward(&pass.first, &dh_first);
    }

    /// One optimizer step over the examples at `indices`; returns their sum
    /// of squared errors.
    fn train_batch(&mut self, set: &TrainingSet, indices: &[usize]) -> f64 {
        self.zero_grad();
        let scale = 2.0 / indices.len() as f64;
        let mut sse = 0.0;

        for &idx in indices {
            let masks = self.sample_masks();
            let pass = self.forward(&set.inputs[idx], Some(&masks));
            let error = pass.prediction - set.targets[idx];
            sse += error * error;
            self.backward(&pass, Some(&masks), scale * error);
        }

        self.apply_gradients();
        sse
    }

    fn mean_squared_error(&self, set: &TrainingSet, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        let sse: f64 = indices
            .iter()
            .map(|&idx| (self.forward(&set.inputs[idx], None).prediction - set.targets[idx]).powi(2))
            .sum();
        sse / indices.len() as f64
    }

    /// Mean squared error over all examples without dropout, with the
    /// gradients of every parameter left in the parameter buffers.
    #[cfg(test)]
    fn loss_and_gradients(&mut self, set: &TrainingSet) -> f64 {
        self.zero_grad();
        let scale = 2.0 / set.len() as f64;
        let mut sse = 0.0;
        for idx in 0..set.len() {
            let pass = self.forward(&set.inputs[idx], None);
            let error = pass.prediction - set.targets[idx];
            sse += error * error;
            self.backward(&pass, None, scale * error);
        }
        sse / set.len() as f64
    }
}

fn collect_params<'a>(
    first: &'a mut LstmLayer,
    second: &'a mut LstmLayer,
    hidden: &'a mut Dense,
    output: &'a mut Dense,
) -> Vec<&'a mut dyn Trainable> {
    first
        .params_mut()
        .into_iter()
        .chain(second.params_mut())
        .chain(hidden.params_mut())
        .chain(output.params_mut())
        .collect()
}

/// Index at which the trailing validation examples begin.
fn split_point(len: usize, validation_split: f64) -> usize {
    let train = (len as f64 * (1.0 - validation_split)).floor() as usize;
    train.clamp(1, len)
}

impl SequenceRegressor for LstmRegressor {
    fn fit(
        &mut self,
        set: &TrainingSet,
        options: &TrainingOptions,
        cancel: &CancelToken,
    ) -> Result<TrainingReport> {
        let started = Instant::now();

        if set.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if set.lookback() != self.lookback || set.inputs.len() != set.targets.len() {
            return Err(ForecastError::invalid_parameter(
                "training_set",
                format!(
                    "expected {} windows of length {}, got {} windows of length {}",
                    set.targets.len(),
                    self.lookback,
                    set.inputs.len(),
                    set.lookback()
                ),
            ));
        }
        if options.epochs == 0 || options.batch_size == 0 {
            return Err(ForecastError::invalid_parameter(
                "options",
                "epochs and batch_size must be at least 1",
            ));
        }

        let train_count = split_point(set.len(), options.validation_split);
        let mut order: Vec<usize> = (0..train_count).collect();
        let validation: Vec<usize> = (train_count..set.len()).collect();

        let mut final_loss = f64::NAN;
        let mut final_val_loss = None;

        for epoch in 0..options.epochs {
            if cancel.is_cancelled() {
                return Err(ForecastError::Cancelled {
                    epochs_completed: epoch,
                });
            }

            order.shuffle(&mut self.rng);
            let mut sse = 0.0;
            for batch in order.chunks(options.batch_size) {
                if cancel.is_cancelled() {
                    return Err(ForecastError::Cancelled {
                        epochs_completed: epoch,
                    });
                }
                sse += self.train_batch(set, batch);
            }

            let loss = sse / train_count as f64;
            if !loss.is_finite() {
                return Err(ForecastError::TrainingFailure(format!(
                    "loss became {} at epoch {}",
                    loss,
                    epoch + 1
                )));
            }

            final_loss = loss;
            final_val_loss =
                (!validation.is_empty()).then(|| self.mean_squared_error(set, &validation));

            if (epoch + 1) % LOG_EVERY_EPOCHS == 0 || epoch + 1 == options.epochs {
                debug!(
                    epoch = epoch + 1,
                    epochs = options.epochs,
                    loss,
                    val_loss = ?final_val_loss,
                    "Epoch complete"
                );
            }
        }

        Ok(TrainingReport {
            epochs_run: options.epochs,
            final_loss,
            final_val_loss,
            training_examples: train_count,
            validation_examples: validation.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn predict(&self, window: &[f64]) -> Result<f64> {
        if window.len() != self.lookback {
            return Err(ForecastError::invalid_parameter(
                "window",
                format!("expected length {}, got {}", self.lookback, window.len()),
            ));
        }
        let prediction = self.forward(window, None).prediction;
        if !prediction.is_finite() {
            return Err(ForecastError::InvalidData(
                "model produced a non-finite prediction".to_string(),
            ));
        }
        Ok(prediction)
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn parameter_count(&self) -> usize {
        self.first.parameter_count()
            + self.second.parameter_count()
            + self.hidden.parameter_count()
            + self.output.parameter_count()
    }
}
