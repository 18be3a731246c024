use std::time::{Duration, Instant};

/// Whether a remote exchange is in flight.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RequestState {
    /// Ready to accept input.
    #[default]
    Idle,

    /// Waiting on the backend.
    Sending {
        /// When the request was issued.
        started_at: Instant,
    },
}

impl RequestState {
    /// Enters the sending state now.
    pub fn sending() -> Self {
        RequestState::Sending {
            started_at: Instant::now(),
        }
    }

    /// Returns true while a request is in flight.
    pub fn is_sending(&self) -> bool {
        matches!(self, RequestState::Sending { .. })
    }

    /// Time spent waiting so far, or `None` when idle.
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            RequestState::Idle => None,
            RequestState::Sending { started_at } => Some(started_at.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_has_no_elapsed() {
        let state = RequestState::default();
        assert!(!state.is_sending());
        assert!(state.elapsed().is_none());
    }

    #[test]
    fn sending_reports_elapsed() {
        let state = RequestState::sending();
        assert!(state.is_sending());
        assert!(state.elapsed().is_some());
    }
}
