//! Asynchronous classifier-training workflow.
//!
//! Classifier creation and retraining are long-running jobs on the service
//! side: the submission call returns immediately with the classifier in a
//! non-terminal status, and the caller polls until training converges.
//! This module drives that lifecycle in three phases:
//!
//! 1. **Submit with bounded retries**: [`submit`] and [`retrain`] retry
//!    transient submission failures until an explicit [`RetryBudget`] is
//!    spent. Permanent failures (client errors, auth) surface immediately
//!    without consuming budget.
//! 2. **Poll until terminal**: [`await_ready`] refreshes the classifier at
//!    a fixed interval until its status is terminal. Polls are strictly
//!    sequential, with one status request in flight at a time.
//! 3. **Fetch the artifact**: once ready, the caller downloads the Core ML
//!    model via [`classifier::core_ml_model`](crate::classifier::core_ml_model).
//!
//! A `failed` terminal status is a result, not an error: `await_ready`
//! returns the classifier and the caller inspects
//! [`Classifier::status`](crate::classifier::Classifier::status).
//!
//! ## Example
//!
//! ```rust,no_run
//! use cognitive_ai_core::client::CognitiveClient;
//! use cognitive_ai_vision::classifier::CreateClassifierRequest;
//! use cognitive_ai_vision::training::{self, PollOptions, RetryBudget};
//!
//! # async fn example(client: &CognitiveClient) -> cognitive_ai_vision::VisionResult<()> {
//! let request = CreateClassifierRequest::builder()
//!     .name("dogs")
//!     .positive_examples("beagle", std::fs::read("beagle.zip").unwrap())
//!     .build()?;
//!
//! let created = training::submit(client, &request, RetryBudget::new(3)).await?;
//! let trained = training::await_ready(
//!     client,
//!     &created.classifier_id,
//!     &PollOptions::default(),
//! ).await?;
//!
//! println!("final status: {:?}", trained.status);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use cognitive_ai_core::client::CognitiveClient;
use tokio_util::sync::CancellationToken;

use crate::classifier::{
    self, Classifier, CreateClassifierRequest, UpdateClassifierRequest,
};
use crate::error::{VisionError, VisionResult};

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default maximum number of polls before giving up (one hour at the
/// default interval).
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 360;

/// A bounded counter of remaining retry attempts for one operation.
///
/// Each retryable operation owns its budget; budgets are never shared or
/// replenished. The budget counts *retries*, so a budget of `n` allows
/// `n + 1` total attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
}

impl RetryBudget {
    /// Create a budget allowing `remaining` retries.
    pub fn new(remaining: u32) -> Self {
        Self { remaining }
    }

    /// Retries left in this budget.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether the budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Consume one retry if any remain. Returns whether a retry was granted.
    fn try_consume(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            false
        }
    }
}

/// Configuration for the status-polling loop.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between successive status polls.
    pub interval: Duration,

    /// Maximum number of polls before [`VisionError::PollTimeout`].
    /// `0` disables the limit (not recommended outside tests).
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

/// Create a classifier, retrying transient submission failures.
///
/// Attempts are immediate: a fresh multipart form is rebuilt from the
/// buffered archives and resubmitted as soon as a transient failure is
/// observed, until the budget is spent. Permanent failures propagate at
/// once without consuming budget.
///
/// # Errors
///
/// Returns [`VisionError::RetriesExhausted`] when every attempt failed
/// transiently, carrying the last failure as its source.
///
/// # Tracing
///
/// Emits a span named `vision::training::submit` with field `name`.
#[tracing::instrument(
    name = "vision::training::submit",
    skip(client, request, budget),
    fields(name = %request.name())
)]
pub async fn submit(
    client: &CognitiveClient,
    request: &CreateClassifierRequest,
    budget: RetryBudget,
) -> VisionResult<Classifier> {
    retry_with_budget(budget, "create classifier", || {
        classifier::create(client, request)
    })
    .await
}

/// Retrain a classifier, retrying transient submission failures.
///
/// Same contract as [`submit`] over
/// [`classifier::update`](crate::classifier::update); pass a fresh,
/// independent budget.
///
/// # Tracing
///
/// Emits a span named `vision::training::retrain` with field `classifier_id`.
#[tracing::instrument(
    name = "vision::training::retrain",
    skip(client, request, budget),
    fields(classifier_id = %classifier_id)
)]
pub async fn retrain(
    client: &CognitiveClient,
    classifier_id: &str,
    request: &UpdateClassifierRequest,
    budget: RetryBudget,
) -> VisionResult<Classifier> {
    retry_with_budget(budget, "retrain classifier", || {
        classifier::update(client, classifier_id, request)
    })
    .await
}

/// Run an operation until it succeeds, its failure is permanent, or the
/// budget is spent. The budget travels through the loop as owned state.
async fn retry_with_budget<T, F, Fut>(
    mut budget: RetryBudget,
    operation: &'static str,
    mut call: F,
) -> VisionResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = VisionResult<T>>,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match call().await {
            Ok(value) => {
                tracing::debug!(attempts, "{operation} succeeded");
                return Ok(value);
            }
            Err(err) if err.is_transient() && budget.try_consume() => {
                tracing::warn!(
                    attempts,
                    remaining = budget.remaining(),
                    error = %err,
                    "transient failure, retrying {operation}"
                );
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(attempts, error = %err, "retry budget spent for {operation}");
                return Err(VisionError::RetriesExhausted {
                    operation,
                    attempts,
                    source: Box::new(err),
                });
            }
            Err(err) => {
                tracing::debug!(attempts, error = %err, "permanent failure for {operation}");
                return Err(err);
            }
        }
    }
}

/// Poll a classifier until it reaches a terminal status.
///
/// Polls are strictly sequential; the next status request is not issued
/// until the previous one has returned and the interval has elapsed. The
/// first terminal status observed is returned as-is; a `failed` classifier
/// is a valid return value, not an error.
///
/// Dropping the returned future between polls abandons the workflow; the
/// remote job keeps running and can be picked up again by a later call.
///
/// # Errors
///
/// Returns [`VisionError::PollTimeout`] if `max_attempts` polls pass
/// without observing a terminal status, and propagates status-refresh
/// failures from the transport.
///
/// # Tracing
///
/// Emits a span named `vision::training::await_ready` with field
/// `classifier_id`.
#[tracing::instrument(
    name = "vision::training::await_ready",
    skip(client, options),
    fields(classifier_id = %classifier_id)
)]
pub async fn await_ready(
    client: &CognitiveClient,
    classifier_id: &str,
    options: &PollOptions,
) -> VisionResult<Classifier> {
    let mut attempts = 0u32;

    loop {
        if options.max_attempts > 0 {
            attempts += 1;
            if attempts > options.max_attempts {
                return Err(VisionError::PollTimeout {
                    attempts: options.max_attempts,
                });
            }
        }

        let classifier = classifier::get(client, classifier_id).await?;

        if classifier.status.is_terminal() {
            tracing::debug!(status = ?classifier.status, "classifier reached terminal status");
            return Ok(classifier);
        }

        tracing::trace!(
            status = ?classifier.status,
            attempt = attempts,
            "classifier still training, waiting"
        );
        tokio::time::sleep(options.interval).await;
    }
}

/// Poll a classifier until it reaches a terminal status or the token is
/// cancelled.
///
/// Same contract as [`await_ready`], plus an explicit cancellation signal:
/// the inter-poll wait races the token, and a fired token makes the next
/// iteration return [`VisionError::Cancelled`] without issuing further
/// requests.
///
/// # Tracing
///
/// Emits a span named `vision::training::await_ready_cancellable` with
/// field `classifier_id`.
#[tracing::instrument(
    name = "vision::training::await_ready_cancellable",
    skip(client, options, cancel),
    fields(classifier_id = %classifier_id)
)]
pub async fn await_ready_cancellable(
    client: &CognitiveClient,
    classifier_id: &str,
    options: &PollOptions,
    cancel: &CancellationToken,
) -> VisionResult<Classifier> {
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            tracing::debug!("polling cancelled");
            return Err(VisionError::Cancelled);
        }

        if options.max_attempts > 0 {
            attempts += 1;
            if attempts > options.max_attempts {
                return Err(VisionError::PollTimeout {
                    attempts: options.max_attempts,
                });
            }
        }

        let classifier = classifier::get(client, classifier_id).await?;

        if classifier.status.is_terminal() {
            tracing::debug!(status = ?classifier.status, "classifier reached terminal status");
            return Ok(classifier);
        }

        tracing::trace!(
            status = ?classifier.status,
            attempt = attempts,
            "classifier still training, waiting"
        );

        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("polling cancelled while waiting");
                return Err(VisionError::Cancelled);
            }
            () = tokio::time::sleep(options.interval) => {}
        }
    }
}

/// Create a classifier and poll until training reaches a terminal status.
///
/// Convenience function combining [`submit`] with [`await_ready`]. The
/// returned classifier may be `failed`; check its status.
pub async fn train(
    client: &CognitiveClient,
    request: &CreateClassifierRequest,
    budget: RetryBudget,
    options: &PollOptions,
) -> VisionResult<Classifier> {
    let created = submit(client, request, budget).await?;
    await_ready(client, &created.classifier_id, options).await
}
