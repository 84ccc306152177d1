//! Classify images against built-in or custom classifiers.

use bytes::Bytes;
use cognitive_ai_core::client::CognitiveClient;
use cognitive_ai_core::CognitiveError;
use serde::{Deserialize, Serialize};

use crate::error::VisionResult;
use crate::models::{ErrorInfo, WarningInfo};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Results for one or more classified images.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifiedImages {
    /// Number of custom classes evaluated, if any were requested.
    pub custom_classes: Option<u32>,

    /// Number of images processed in this request.
    pub images_processed: Option<u32>,

    /// Per-image results.
    pub images: Vec<ClassifiedImage>,

    /// Warnings such as skipped images.
    #[serde(default)]
    pub warnings: Vec<WarningInfo>,
}

/// Classification results for a single image.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifiedImage {
    /// Source URL, when the image was fetched by the service.
    pub source_url: Option<String>,

    /// Resolved URL, when the image was fetched by the service.
    pub resolved_url: Option<String>,

    /// File name, when the image was uploaded.
    pub image: Option<String>,

    /// Error details when this image could not be processed.
    pub error: Option<ErrorInfo>,

    /// Results per classifier.
    #[serde(default)]
    pub classifiers: Vec<ClassifierResult>,
}

/// Results from a single classifier for one image.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierResult {
    /// Name of the classifier.
    pub name: String,

    /// Identifier of the classifier.
    pub classifier_id: String,

    /// Classes that matched above the threshold.
    #[serde(default)]
    pub classes: Vec<ClassResult>,
}

/// A single matched class with its confidence score.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassResult {
    /// Name of the class.
    #[serde(rename = "class")]
    pub name: String,

    /// Confidence score in the range 0.0 to 1.0.
    pub score: f32,

    /// Knowledge-graph hierarchy for the class, when available.
    pub type_hierarchy: Option<String>,
}

// ---------------------------------------------------------------------------
// Request type
// ---------------------------------------------------------------------------

/// Non-image parameters, serialized as a JSON part of the multipart form.
#[derive(Debug, Default, Serialize)]
struct ClassifyParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    owners: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    classifier_ids: Option<Vec<String>>,
}

/// A request to classify an image, supplied either as uploaded bytes or as
/// a URL the service fetches.
///
/// ```rust
/// use cognitive_ai_vision::classify::ClassifyRequest;
///
/// let request = ClassifyRequest::builder()
///     .url("https://example.com/dog.jpg")
///     .threshold(0.6)
///     .classifier_ids(["dogs_1234"])
///     .build()
///     .expect("valid request");
/// ```
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    image: Option<(String, Bytes)>,
    url: Option<String>,
    threshold: Option<f32>,
    owners: Option<Vec<String>>,
    classifier_ids: Option<Vec<String>>,
}

/// Builder for [`ClassifyRequest`].
#[derive(Debug, Default)]
pub struct ClassifyRequestBuilder {
    image: Option<(String, Bytes)>,
    url: Option<String>,
    threshold: Option<f32>,
    owners: Option<Vec<String>>,
    classifier_ids: Option<Vec<String>>,
}

impl ClassifyRequest {
    /// Create a new builder for `ClassifyRequest`.
    pub fn builder() -> ClassifyRequestBuilder {
        ClassifyRequestBuilder::default()
    }

    pub(crate) fn to_form(&self) -> VisionResult<reqwest::multipart::Form> {
        let parameters = ClassifyParameters {
            url: self.url.clone(),
            threshold: self.threshold,
            owners: self.owners.clone(),
            classifier_ids: self.classifier_ids.clone(),
        };
        let parameters_json =
            serde_json::to_string(&parameters).map_err(CognitiveError::from)?;

        let mut form =
            reqwest::multipart::Form::new().text("parameters", parameters_json);
        if let Some((file_name, data)) = &self.image {
            let part = reqwest::multipart::Part::bytes(data.to_vec())
                .file_name(file_name.clone());
            form = form.part("images_file", part);
        }
        Ok(form)
    }
}

impl ClassifyRequestBuilder {
    /// Upload an image (or a zip of up to 20 images) to classify.
    ///
    /// Either an image or a [`url`](Self::url) is **required**.
    pub fn image(mut self, file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.image = Some((file_name.into(), data.into()));
        self
    }

    /// URL of an image for the service to fetch and classify.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Minimum score a class must have to be included in the results.
    ///
    /// Must be between 0.0 and 1.0.
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Restrict results to classifiers owned by `IBM`, `me`, or both.
    pub fn owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owners = Some(owners.into_iter().map(Into::into).collect());
        self
    }

    /// Classify against specific classifiers instead of the default one.
    pub fn classifier_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classifier_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns an error if neither an image nor a URL was supplied, or the
    /// threshold is outside 0.0 to 1.0.
    pub fn build(self) -> VisionResult<ClassifyRequest> {
        if self.image.is_none() && self.url.is_none() {
            return Err(
                CognitiveError::Builder("an image or a url is required".into()).into(),
            );
        }

        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(CognitiveError::Builder(
                    "threshold must be between 0.0 and 1.0".into(),
                )
                .into());
            }
        }

        Ok(ClassifyRequest {
            image: self.image,
            url: self.url,
            threshold: self.threshold,
            owners: self.owners,
            classifier_ids: self.classifier_ids,
        })
    }
}

// ---------------------------------------------------------------------------
// API function
// ---------------------------------------------------------------------------

/// Classify an image against built-in or custom classifiers.
///
/// # Tracing
///
/// Emits a span named `vision::classify`.
#[tracing::instrument(name = "vision::classify", skip(client, request))]
pub async fn classify(
    client: &CognitiveClient,
    request: &ClassifyRequest,
) -> VisionResult<ClassifiedImages> {
    tracing::debug!("classifying image");

    let response = client.post_multipart("/v3/classify", request.to_form()?).await?;
    let results = response
        .json::<ClassifiedImages>()
        .await
        .map_err(CognitiveError::from)?;

    tracing::debug!(
        images = results.images.len(),
        "classification completed"
    );
    Ok(results)
}
