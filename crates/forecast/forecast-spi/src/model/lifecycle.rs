//! Model lifecycle states, training options and cancellation.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// State of a model owned by a lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Untrained,
    Trained,
    Disposed,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Untrained => write!(f, "untrained"),
            LifecycleState::Trained => write!(f, "trained"),
            LifecycleState::Disposed => write!(f, "disposed"),
        }
    }
}

/// Parameters of a single training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingOptions {
    /// Window length fed to the model
    pub lookback: usize,
    /// Fixed epoch budget; there is no early stopping
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of the examples, taken from the end, held out for validation
    pub validation_split: f64,
}

/// Outcome of a successful training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs_run: usize,
    /// Mean squared error over the training examples in the last epoch
    pub final_loss: f64,
    /// Mean squared error over the validation examples, if any were held out
    pub final_val_loss: Option<f64>,
    pub training_examples: usize,
    pub validation_examples: usize,
    pub elapsed_ms: u64,
}

/// Shared flag used to abandon a training run from another thread.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
