//! Custom classifier management for the visual recognition service.
//!
//! This module provides functions to create, retrieve, list, update, and
//! delete custom classifiers, and to download the Core ML artifact of a
//! trained classifier. Creation and retraining are asynchronous on the
//! service side; see the [`training`](crate::training) module for the
//! submit-and-poll workflow built on top of these calls.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cognitive_ai_core::client::CognitiveClient;
//! use cognitive_ai_core::auth::ServiceCredential;
//! use cognitive_ai_vision::classifier::{self, CreateClassifierRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CognitiveClient::builder()
//!     .endpoint("https://gateway.cognitive.example.com/visual-recognition/api")
//!     .credential(ServiceCredential::api_key("your-key"))
//!     .build()?;
//!
//! let request = CreateClassifierRequest::builder()
//!     .name("dogs")
//!     .positive_examples("beagle", std::fs::read("beagle.zip")?)
//!     .build()?;
//!
//! let created = classifier::create(&client, &request).await?;
//! println!("training started: {}", created.classifier_id);
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use cognitive_ai_core::client::CognitiveClient;
use cognitive_ai_core::error::CognitiveError;
use serde::{Deserialize, Serialize};

use crate::error::{VisionError, VisionResult};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Training status of a classifier.
///
/// Only the service advances a classifier's status; clients observe it.
/// `Ready` and `Failed` are terminal; the service guarantees no further
/// transitions out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierStatus {
    /// Training finished and the classifier can be used.
    Ready,
    /// Initial training is in progress.
    Training,
    /// The classifier is being retrained with new examples.
    Retraining,
    /// Training failed; the classifier is unusable.
    Failed,
    /// A status this SDK does not recognize. Treated as non-terminal so
    /// that newly introduced in-progress statuses keep polls alive.
    #[serde(other)]
    Unknown,
}

impl ClassifierStatus {
    /// Whether the service guarantees no further status transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

/// A custom classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct Classifier {
    /// Opaque identifier assigned by the service at creation. Immutable.
    pub classifier_id: String,

    /// Caller-supplied name. Not guaranteed unique on the service side.
    pub name: String,

    /// Current training status.
    pub status: ClassifierStatus,

    /// Explanation for a `failed` status, if the service provided one.
    pub explanation: Option<String>,

    /// Owner of the classifier.
    pub owner: Option<String>,

    /// Timestamp when the classifier was created.
    pub created: Option<String>,

    /// Timestamp when the classifier was last retrained.
    pub retrained: Option<String>,

    /// Classes this classifier can recognize.
    #[serde(default)]
    pub classes: Vec<ClassInfo>,

    /// Whether a Core ML artifact is available for download.
    pub core_ml_enabled: Option<bool>,
}

/// A single class a classifier recognizes.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassInfo {
    /// Name of the class.
    #[serde(rename = "class")]
    pub name: String,
}

/// A page of classifiers owned by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierList {
    /// The classifiers.
    pub classifiers: Vec<Classifier>,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A request to create a new classifier from zipped example images.
///
/// Use the builder pattern to construct requests:
///
/// ```rust
/// use cognitive_ai_vision::classifier::CreateClassifierRequest;
///
/// let request = CreateClassifierRequest::builder()
///     .name("dogs")
///     .positive_examples("beagle", vec![0x50, 0x4b, 0x03, 0x04])
///     .build()
///     .expect("valid request");
/// ```
#[derive(Debug, Clone)]
pub struct CreateClassifierRequest {
    name: String,
    positive_examples: Vec<(String, Bytes)>,
    negative_examples: Option<Bytes>,
}

/// Builder for [`CreateClassifierRequest`].
#[derive(Debug, Default)]
pub struct CreateClassifierRequestBuilder {
    name: Option<String>,
    positive_examples: Vec<(String, Bytes)>,
    negative_examples: Option<Bytes>,
}

impl CreateClassifierRequest {
    /// Create a new builder for `CreateClassifierRequest`.
    pub fn builder() -> CreateClassifierRequestBuilder {
        CreateClassifierRequestBuilder::default()
    }

    /// The caller-supplied classifier name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the multipart form for this request.
    ///
    /// Forms are single-use; this rebuilds one from the buffered archives
    /// each time, which is what makes submission retries possible.
    pub(crate) fn to_form(&self) -> VisionResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new().text("name", self.name.clone());
        for (class, data) in &self.positive_examples {
            form = form.part(
                format!("{class}_positive_examples"),
                zip_part(class, data.clone())?,
            );
        }
        if let Some(data) = &self.negative_examples {
            form = form.part("negative_examples", zip_part("negative", data.clone())?);
        }
        Ok(form)
    }
}

impl CreateClassifierRequestBuilder {
    /// Set the classifier name.
    ///
    /// **Required.**
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a zip archive of positive example images for a class.
    ///
    /// At least one class is **required**. Call repeatedly for multiple
    /// classes.
    pub fn positive_examples(mut self, class: impl Into<String>, zip: impl Into<Bytes>) -> Self {
        self.positive_examples.push((class.into(), zip.into()));
        self
    }

    /// Set a zip archive of negative example images.
    pub fn negative_examples(mut self, zip: impl Into<Bytes>) -> Self {
        self.negative_examples = Some(zip.into());
        self
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is missing or empty, no positive example
    /// archives were added, or a class name is empty.
    pub fn build(self) -> VisionResult<CreateClassifierRequest> {
        let name = self
            .name
            .ok_or_else(|| CognitiveError::Builder("name is required".into()))?;

        if name.trim().is_empty() {
            return Err(CognitiveError::Builder("name cannot be empty".into()).into());
        }

        if self.positive_examples.is_empty() {
            return Err(CognitiveError::Builder(
                "at least one positive_examples archive is required".into(),
            )
            .into());
        }

        for (class, _) in &self.positive_examples {
            if class.trim().is_empty() {
                return Err(CognitiveError::Builder("class name cannot be empty".into()).into());
            }
        }

        Ok(CreateClassifierRequest {
            name,
            positive_examples: self.positive_examples,
            negative_examples: self.negative_examples,
        })
    }
}

/// A request to retrain an existing classifier with additional examples.
#[derive(Debug, Clone)]
pub struct UpdateClassifierRequest {
    positive_examples: Vec<(String, Bytes)>,
    negative_examples: Option<Bytes>,
}

/// Builder for [`UpdateClassifierRequest`].
#[derive(Debug, Default)]
pub struct UpdateClassifierRequestBuilder {
    positive_examples: Vec<(String, Bytes)>,
    negative_examples: Option<Bytes>,
}

impl UpdateClassifierRequest {
    /// Create a new builder for `UpdateClassifierRequest`.
    pub fn builder() -> UpdateClassifierRequestBuilder {
        UpdateClassifierRequestBuilder::default()
    }

    pub(crate) fn to_form(&self) -> VisionResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for (class, data) in &self.positive_examples {
            form = form.part(
                format!("{class}_positive_examples"),
                zip_part(class, data.clone())?,
            );
        }
        if let Some(data) = &self.negative_examples {
            form = form.part("negative_examples", zip_part("negative", data.clone())?);
        }
        Ok(form)
    }
}

impl UpdateClassifierRequestBuilder {
    /// Add a zip archive of positive example images for a class.
    ///
    /// New classes are added to the classifier; existing classes are
    /// retrained with the additional images.
    pub fn positive_examples(mut self, class: impl Into<String>, zip: impl Into<Bytes>) -> Self {
        self.positive_examples.push((class.into(), zip.into()));
        self
    }

    /// Set a zip archive of negative example images.
    pub fn negative_examples(mut self, zip: impl Into<Bytes>) -> Self {
        self.negative_examples = Some(zip.into());
        self
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns an error if no example archives were added, or a class name
    /// is empty.
    pub fn build(self) -> VisionResult<UpdateClassifierRequest> {
        if self.positive_examples.is_empty() && self.negative_examples.is_none() {
            return Err(CognitiveError::Builder(
                "at least one positive or negative examples archive is required".into(),
            )
            .into());
        }

        for (class, _) in &self.positive_examples {
            if class.trim().is_empty() {
                return Err(CognitiveError::Builder("class name cannot be empty".into()).into());
            }
        }

        Ok(UpdateClassifierRequest {
            positive_examples: self.positive_examples,
            negative_examples: self.negative_examples,
        })
    }
}

fn zip_part(class: &str, data: Bytes) -> VisionResult<reqwest::multipart::Part> {
    let part = reqwest::multipart::Part::bytes(data.to_vec())
        .file_name(format!("{class}.zip"))
        .mime_str("application/zip")
        .map_err(CognitiveError::from)?;
    Ok(part)
}

// ---------------------------------------------------------------------------
// API functions
// ---------------------------------------------------------------------------

/// Create a classifier and start its initial training.
///
/// Returns the classifier in `training` status. Training is asynchronous;
/// poll with [`get`] or use [`training::await_ready`](crate::training::await_ready).
///
/// # Tracing
///
/// Emits a span named `vision::classifiers::create` with field `name`.
#[tracing::instrument(
    name = "vision::classifiers::create",
    skip(client, request),
    fields(name = %request.name)
)]
pub async fn create(
    client: &CognitiveClient,
    request: &CreateClassifierRequest,
) -> VisionResult<Classifier> {
    tracing::debug!("creating classifier");

    let response = client
        .post_multipart("/v3/classifiers", request.to_form()?)
        .await?;
    let classifier = response
        .json::<Classifier>()
        .await
        .map_err(CognitiveError::from)?;

    tracing::debug!(
        classifier_id = %classifier.classifier_id,
        status = ?classifier.status,
        "classifier created"
    );
    Ok(classifier)
}

/// Get the current state of a classifier.
///
/// Use this to poll for training completion.
///
/// # Tracing
///
/// Emits a span named `vision::classifiers::get` with field `classifier_id`.
#[tracing::instrument(
    name = "vision::classifiers::get",
    skip(client),
    fields(classifier_id = %classifier_id)
)]
pub async fn get(client: &CognitiveClient, classifier_id: &str) -> VisionResult<Classifier> {
    tracing::debug!("getting classifier");

    let path = format!("/v3/classifiers/{classifier_id}");
    let response = client.get(&path).await?;
    let classifier = response
        .json::<Classifier>()
        .await
        .map_err(CognitiveError::from)?;

    tracing::debug!(status = ?classifier.status, "classifier retrieved");
    Ok(classifier)
}

/// List the caller's classifiers.
///
/// With `verbose`, each entry carries its full details instead of just the
/// id, name, and status.
///
/// # Tracing
///
/// Emits a span named `vision::classifiers::list`.
#[tracing::instrument(name = "vision::classifiers::list", skip(client))]
pub async fn list(client: &CognitiveClient, verbose: bool) -> VisionResult<ClassifierList> {
    tracing::debug!("listing classifiers");

    let path = if verbose {
        "/v3/classifiers?verbose=true"
    } else {
        "/v3/classifiers"
    };
    let response = client.get(path).await?;
    let list = response
        .json::<ClassifierList>()
        .await
        .map_err(CognitiveError::from)?;

    tracing::debug!(count = list.classifiers.len(), "classifiers listed");
    Ok(list)
}

/// Retrain a classifier with additional examples.
///
/// Returns the classifier in `retraining` status. Like creation, this is
/// asynchronous on the service side.
///
/// # Tracing
///
/// Emits a span named `vision::classifiers::update` with field `classifier_id`.
#[tracing::instrument(
    name = "vision::classifiers::update",
    skip(client, request),
    fields(classifier_id = %classifier_id)
)]
pub async fn update(
    client: &CognitiveClient,
    classifier_id: &str,
    request: &UpdateClassifierRequest,
) -> VisionResult<Classifier> {
    tracing::debug!("updating classifier");

    let path = format!("/v3/classifiers/{classifier_id}");
    let response = client
        .post_multipart(&path, request.to_form()?)
        .await?;
    let classifier = response
        .json::<Classifier>()
        .await
        .map_err(CognitiveError::from)?;

    tracing::debug!(status = ?classifier.status, "classifier update accepted");
    Ok(classifier)
}

/// Delete a classifier.
///
/// Not retried: any failure propagates directly to the caller. Deleting a
/// classifier that no longer exists surfaces the service's not-found error
/// unchanged.
///
/// # Tracing
///
/// Emits a span named `vision::classifiers::delete` with field `classifier_id`.
#[tracing::instrument(
    name = "vision::classifiers::delete",
    skip(client),
    fields(classifier_id = %classifier_id)
)]
pub async fn delete(client: &CognitiveClient, classifier_id: &str) -> VisionResult<()> {
    tracing::debug!("deleting classifier");

    let path = format!("/v3/classifiers/{classifier_id}");
    client.delete(&path).await?;

    tracing::debug!("classifier deleted");
    Ok(())
}

/// Download the Core ML artifact of a trained classifier.
///
/// The classifier must be [`ClassifierStatus::Ready`]; otherwise this
/// returns [`VisionError::NotReady`] without issuing a request. Download
/// failures are not retried.
///
/// # Tracing
///
/// Emits a span named `vision::classifiers::core_ml_model` with field
/// `classifier_id`.
#[tracing::instrument(
    name = "vision::classifiers::core_ml_model",
    skip(client, classifier),
    fields(classifier_id = %classifier.classifier_id)
)]
pub async fn core_ml_model(
    client: &CognitiveClient,
    classifier: &Classifier,
) -> VisionResult<Bytes> {
    if classifier.status != ClassifierStatus::Ready {
        return Err(VisionError::NotReady {
            classifier_id: classifier.classifier_id.clone(),
            status: classifier.status,
        });
    }

    tracing::debug!("downloading Core ML model");

    let path = format!("/v3/classifiers/{}/core_ml_model", classifier.classifier_id);
    let response = client.get_once(&path).await?;
    let model = response.bytes().await.map_err(CognitiveError::from)?;

    tracing::debug!(size = model.len(), "Core ML model downloaded");
    Ok(model)
}
