use crate::classifier::ClassifierStatus;
use cognitive_ai_core::CognitiveError;
use thiserror::Error;

/// Errors produced by the visual recognition crate.
///
/// Transport and API errors pass through from the core client; the
/// additional variants cover the training workflow.
#[derive(Error, Debug)]
pub enum VisionError {
    /// An underlying transport or API error.
    #[error(transparent)]
    Core(#[from] CognitiveError),

    /// A retryable operation failed more times than its budget allowed.
    ///
    /// `attempts` counts every attempt made, including the initial one.
    /// The last failure is preserved as the source.
    #[error("{operation} failed after {attempts} attempts")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: Box<VisionError>,
    },

    /// Polling gave up before the classifier reached a terminal status.
    #[error("classifier did not reach a terminal status within {attempts} polls")]
    PollTimeout { attempts: u32 },

    /// An operation required a ready classifier but its status was something
    /// else. Raised locally, before any request is issued.
    #[error("classifier {classifier_id} is not ready (status: {status:?})")]
    NotReady {
        classifier_id: String,
        status: ClassifierStatus,
    },

    /// The polling workflow was cancelled by the caller.
    #[error("polling was cancelled")]
    Cancelled,
}

/// Result type alias for visual recognition operations.
pub type VisionResult<T> = std::result::Result<T, VisionError>;

impl VisionError {
    /// Whether this error is transient and worth retrying.
    ///
    /// Only transport-level errors can be transient; workflow errors
    /// (exhausted budgets, timeouts, preconditions) never are.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Core(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_transience_passes_through() {
        let err = VisionError::from(CognitiveError::Http {
            status: 503,
            message: "Service Unavailable".into(),
        });
        assert!(err.is_transient());

        let err = VisionError::from(CognitiveError::Http {
            status: 400,
            message: "Bad Request".into(),
        });
        assert!(!err.is_transient());
    }

    #[test]
    fn workflow_errors_are_permanent() {
        let exhausted = VisionError::RetriesExhausted {
            operation: "create classifier",
            attempts: 4,
            source: Box::new(VisionError::Cancelled),
        };
        assert!(!exhausted.is_transient());
        assert!(!VisionError::PollTimeout { attempts: 360 }.is_transient());
        assert!(!VisionError::Cancelled.is_transient());
    }

    #[test]
    fn retries_exhausted_preserves_source() {
        use std::error::Error as _;

        let err = VisionError::RetriesExhausted {
            operation: "create classifier",
            attempts: 4,
            source: Box::new(VisionError::from(CognitiveError::Http {
                status: 503,
                message: "Service Unavailable".into(),
            })),
        };

        let source = err.source().expect("should have a source");
        assert!(source.to_string().contains("503"));
    }
}
