//! Submit-and-wait driver for remote predictions.
//!
//! A prediction is submitted once and its status reloaded at most
//! `max_polls` times. The wait stops as soon as a terminal status shows up,
//! when the optional overall timeout elapses, or when the caller cancels.
//! A prediction created remotely is canceled there whenever the wait is
//! abandoned early.
//! Nothing escapes as an error: every transport problem is reported as a
//! `(failed, absent)` result.

use insight_core::prediction::{
    PollPolicy, PredictionBackend, PredictionHandle, PredictionRequest, PredictionResult,
    PredictionSnapshot,
};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Drives a [`PredictionBackend`] for a single model.
pub struct PredictionClient<B: PredictionBackend> {
    backend: Arc<B>,
    model_id: String,
}

impl<B: PredictionBackend> Clone for PredictionClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            model_id: self.model_id.clone(),
        }
    }
}

impl<B: PredictionBackend> PredictionClient<B> {
    pub fn new(backend: B, model_id: impl Into<String>) -> Self {
        Self::from_shared(Arc::new(backend), model_id)
    }

    pub fn from_shared(backend: Arc<B>, model_id: impl Into<String>) -> Self {
        Self {
            backend,
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Submits `request` and waits for a terminal status.
    ///
    /// If polling is exhausted while the prediction is still pending, the
    /// pending result is returned; callers treat it as a failure.
    pub async fn submit_and_await(
        &self,
        request: &PredictionRequest,
        policy: PollPolicy,
    ) -> PredictionResult {
        self.submit_and_await_with_cancel(request, policy, &CancellationToken::new())
            .await
    }

    /// Same as [`submit_and_await`](Self::submit_and_await), but stops early
    /// with a `canceled` result when `cancel` fires.
    pub async fn submit_and_await_with_cancel(
        &self,
        request: &PredictionRequest,
        policy: PollPolicy,
        cancel: &CancellationToken,
    ) -> PredictionResult {
        let created = OnceLock::new();
        let wait = self.poll_until_terminal(request, policy, cancel, &created);
        match policy.overall_timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        model = %self.model_id,
                        timeout_ms = limit.as_millis() as u64,
                        "Prediction wait timed out"
                    );
                    if let Some(handle) = created.get() {
                        self.cancel_remote(handle).await;
                    }
                    PredictionResult::failed()
                }
            },
            None => wait.await,
        }
    }

    /// Records the remote handle in `created` as soon as it exists.
    async fn poll_until_terminal(
        &self,
        request: &PredictionRequest,
        policy: PollPolicy,
        cancel: &CancellationToken,
        created: &OnceLock<PredictionHandle>,
    ) -> PredictionResult {
        let submitted = tokio::select! {
            _ = cancel.cancelled() => return PredictionResult::canceled(),
            submitted = self.backend.create_prediction(&self.model_id, request) => submitted,
        };
        let mut last = match submitted {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(model = %self.model_id, error = %err, "Prediction submission failed");
                return PredictionResult::failed();
            }
        };
        let handle = last.handle.clone();
        let _ = created.set(handle.clone());
        tracing::debug!(prediction_id = %handle.id, status = ?last.status, "Prediction created");

        for attempt in 1..=policy.max_polls {
            if last.status.is_terminal() {
                break;
            }

            let reloaded = tokio::select! {
                _ = cancel.cancelled() => return self.cancel_remote(&handle).await,
                reloaded = self.backend.reload(&handle) => reloaded,
            };
            last = match reloaded {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    tracing::warn!(prediction_id = %handle.id, attempt, error = %err, "Prediction reload failed");
                    return PredictionResult::failed();
                }
            };
            tracing::debug!(prediction_id = %handle.id, attempt, status = ?last.status, "Prediction polled");

            if !last.status.is_terminal() && attempt < policy.max_polls {
                tokio::select! {
                    _ = cancel.cancelled() => return self.cancel_remote(&handle).await,
                    _ = tokio::time::sleep(policy.poll_interval) => {}
                }
            }
        }

        log_outcome(&last, policy);
        last.into_result()
    }

    async fn cancel_remote(&self, handle: &PredictionHandle) -> PredictionResult {
        tracing::info!(prediction_id = %handle.id, "Canceling prediction");
        if let Err(err) = self.backend.cancel(handle).await {
            tracing::warn!(prediction_id = %handle.id, error = %err, "Remote cancel failed");
        }
        PredictionResult::canceled()
    }
}

fn log_outcome(snapshot: &PredictionSnapshot, policy: PollPolicy) {
    let id = &snapshot.handle.id;
    if !snapshot.status.is_terminal() {
        tracing::warn!(prediction_id = %id, max_polls = policy.max_polls, "Prediction still pending after last poll");
    } else if let Some(error) = &snapshot.error {
        tracing::warn!(prediction_id = %id, status = ?snapshot.status, error = %error, "Prediction finished with an error");
    } else {
        tracing::debug!(prediction_id = %id, status = ?snapshot.status, "Prediction finished");
    }
}
