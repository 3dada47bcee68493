use crate::error::{DashboardError, Result};
use crate::models::RequestState;
use futures::FutureExt;
use log::{debug, error};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Holds the request state of one screen's data and publishes every
/// transition to subscribers.
///
/// Each `run` takes a new generation number. When a slower, superseded fetch
/// completes after a newer one has started, its result is dropped instead of
/// overwriting the newer state.
pub struct Query<T> {
    state: watch::Sender<RequestState<T>>,
    generation: AtomicU64,
}

impl<T: Clone> Query<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RequestState::Initial);
        Self {
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    pub async fn run<F>(&self, fetch: F) -> RequestState<T>
    where
        F: Future<Output = Result<T>>,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(RequestState::Loading);

        let next = match AssertUnwindSafe(fetch).catch_unwind().await {
            Ok(result) => RequestState::from(result),
            Err(_) => {
                error!("Fetch panicked");
                RequestState::Error(Arc::new(DashboardError::Unknown))
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale response of generation {}", generation);
            return self.state();
        }
        if let RequestState::Error(e) = &next {
            error!("Fetch failed: {}", e);
        }
        self.state.send_replace(next.clone());
        next
    }

    /// Applies `update` to loaded data in place; no-op in any other state.
    pub fn update_loaded<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        self.state.send_if_modified(|state| match state {
            RequestState::Loaded(data) => {
                update(data);
                true
            }
            _ => false,
        })
    }
}

impl<T: Clone> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}
