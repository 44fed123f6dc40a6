//! Thread-safe handle over a [`PredictionService`].

use crate::service::{PredictionService, TrainingSummary};
use forecast_api::ForecastConfig;
use forecast_spi::{
    CancelToken, ForecastError, ForecastResult, HistoricalDataset, LifecycleState, Reading,
    Result,
};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use tracing::info;

/// Serializes access to one prediction service.
///
/// Only one train runs at a time: a second `train` fails with
/// [`ForecastError::Busy`] instead of queueing. A train started while a
/// forecast holds the service waits for it.
#[derive(Debug)]
pub struct ForecastSession {
    service: Mutex<PredictionService>,
    active: Mutex<Option<CancelToken>>,
}

/// Clears the active token when a train ends, including by panic.
struct ActiveRun<'a>(&'a ForecastSession);

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        *self.0.active_token() = None;
    }
}

impl ForecastSession {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        Ok(Self::from_service(PredictionService::new(config)?))
    }

    pub fn from_service(service: PredictionService) -> Self {
        Self {
            service: Mutex::new(service),
            active: Mutex::new(None),
        }
    }

    pub fn train(&self, dataset: &HistoricalDataset) -> Result<TrainingSummary> {
        self.train_with_cancel(dataset, CancelToken::new())
    }

    /// Train under a caller-owned token, so the caller can stop this run
    /// without knowing whether it has started.
    pub fn train_with_cancel(
        &self,
        dataset: &HistoricalDataset,
        cancel: CancelToken,
    ) -> Result<TrainingSummary> {
        // Claim the run before taking the service so `is_training` holds
        // from the first moment.
        let _run = {
            let mut active = self.active_token();
            if active.is_some() {
                return Err(ForecastError::Busy);
            }
            *active = Some(cancel.clone());
            ActiveRun(self)
        };

        self.lock().train_with_cancel(dataset, &cancel)
    }

    /// Request cancellation of the running train; returns whether one was
    /// running.
    pub fn cancel(&self) -> bool {
        match self.active_token().as_ref() {
            Some(token) => {
                token.cancel();
                info!("Training cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn is_training(&self) -> bool {
        self.active_token().is_some()
    }

    pub fn forecast(
        &self,
        series: &[Reading],
        origin_timestamp: i64,
        steps: usize,
    ) -> Result<ForecastResult> {
        self.lock().forecast(series, origin_timestamp, steps)
    }

    pub fn forecast_dataset(
        &self,
        dataset: &HistoricalDataset,
        steps: usize,
    ) -> Result<ForecastResult> {
        self.lock().forecast_dataset(dataset, steps)
    }

    /// Cancel a running train, then release the model once the service is
    /// free.
    pub fn dispose(&self) {
        self.cancel();
        self.lock().dispose();
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state()
    }

    /// Lifecycle state, or `None` while another call holds the service.
    pub fn try_state(&self) -> Option<LifecycleState> {
        self.try_lock().map(|service| service.state())
    }

    pub fn last_training(&self) -> Option<TrainingSummary> {
        self.lock().last_training().cloned()
    }

    pub fn config(&self) -> ForecastConfig {
        self.lock().config().clone()
    }

    fn lock(&self) -> MutexGuard<'_, PredictionService> {
        self.service.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_lock(&self) -> Option<MutexGuard<'_, PredictionService>> {
        match self.service.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        }
    }

    fn active_token(&self) -> MutexGuard<'_, Option<CancelToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
