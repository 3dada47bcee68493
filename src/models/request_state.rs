use crate::error::DashboardError;
use std::sync::Arc;

/// Lifecycle of a single fetch as seen by the presentation layer.
#[derive(Debug, Clone)]
pub enum RequestState<T> {
    Initial,
    Loading,
    Loaded(T),
    Error(Arc<DashboardError>),
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        RequestState::Initial
    }
}

impl<T> RequestState<T> {
    pub fn is_initial(&self) -> bool {
        matches!(self, RequestState::Initial)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, RequestState::Loaded(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RequestState::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            RequestState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DashboardError> {
        match self {
            RequestState::Error(err) => Some(&**err),
            _ => None,
        }
    }
}

impl<T> From<Result<T, DashboardError>> for RequestState<T> {
    fn from(result: Result<T, DashboardError>) -> Self {
        match result {
            Ok(data) => RequestState::Loaded(data),
            Err(err) => RequestState::Error(Arc::new(err)),
        }
    }
}
