use insight_core::prediction::{PredictionRequest, PredictionResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Whether results that did not succeed are memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Store every result, failures included. A memoized failure is replayed
    /// until [`ResultCache::clear`] is called.
    #[default]
    Memoize,
    /// Only store succeeded results.
    Skip,
}

/// In-memory memoization of prediction results.
///
/// Keys are the structural identity of a [`PredictionRequest`]. There is no
/// eviction and no TTL; entries live until `clear` or until the owning
/// session is dropped.
#[derive(Clone, Default)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<String, PredictionResult>>>,
    failure_policy: FailurePolicy,
}

impl ResultCache {
    /// Creates a new empty ResultCache that memoizes failures too.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_policy(failure_policy: FailurePolicy) -> Self {
        Self {
            entries: Arc::default(),
            failure_policy,
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Gets a memoized result for `request`.
    pub async fn get(&self, request: &PredictionRequest) -> Option<PredictionResult> {
        let entries = self.entries.read().await;
        entries.get(&request.cache_key()).cloned()
    }

    /// Returns the memoized result for `request`, or runs `compute`, stores
    /// its result according to the failure policy and returns it.
    pub async fn get_or_compute<F, Fut>(
        &self,
        request: &PredictionRequest,
        compute: F,
    ) -> PredictionResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PredictionResult>,
    {
        let key = request.cache_key();
        if let Some(hit) = self.entries.read().await.get(&key) {
            tracing::debug!(status = ?hit.status, "Prediction served from cache");
            return hit.clone();
        }

        let result = compute().await;

        if result.is_success() || self.failure_policy == FailurePolicy::Memoize {
            let mut entries = self.entries.write().await;
            entries.insert(key, result.clone());
        }
        result
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
