//! Evaluation observers.
//!
//! Observers are capabilities handed to the engine so callers can audit or
//! notify on every decision without the engine holding global state.

use std::sync::Mutex;

use crate::policy::PolicyDetails;

use super::Evaluation;

/// Receives every completed evaluation.
pub trait EvaluationObserver<P = PolicyDetails>: Send + Sync {
    /// Called once per successful `evaluate`.
    fn on_evaluation(&self, evaluation: &Evaluation<P>);
}

/// Observer that keeps every evaluation in memory.
#[derive(Debug)]
pub struct RecordingObserver<P = PolicyDetails> {
    seen: Mutex<Vec<Evaluation<P>>>,
}

impl<P> Default for RecordingObserver<P> {
    fn default() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl<P> RecordingObserver<P> {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded evaluations and clears the buffer.
    pub fn drain(&self) -> Vec<Evaluation<P>> {
        // A poisoned buffer still holds valid data.
        let mut seen = self.seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::take(&mut *seen)
    }

    /// Number of recorded evaluations.
    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: Clone + Send> EvaluationObserver<P> for RecordingObserver<P> {
    fn on_evaluation(&self, evaluation: &Evaluation<P>) {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(evaluation.clone());
    }
}
