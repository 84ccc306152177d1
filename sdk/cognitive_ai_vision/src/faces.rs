//! Detect faces in images.

use bytes::Bytes;
use cognitive_ai_core::client::CognitiveClient;
use cognitive_ai_core::CognitiveError;
use serde::Deserialize;

use crate::error::VisionResult;
use crate::models::{ErrorInfo, WarningInfo};

/// Face detection results for one or more images.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectedFaces {
    /// Number of images processed in this request.
    pub images_processed: Option<u32>,

    /// Per-image results.
    pub images: Vec<ImageWithFaces>,

    /// Warnings such as skipped images.
    #[serde(default)]
    pub warnings: Vec<WarningInfo>,
}

/// Faces detected in a single image.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageWithFaces {
    /// Source URL, when the image was fetched by the service.
    pub source_url: Option<String>,

    /// Resolved URL, when the image was fetched by the service.
    pub resolved_url: Option<String>,

    /// File name, when the image was uploaded.
    pub image: Option<String>,

    /// Error details when this image could not be processed.
    pub error: Option<ErrorInfo>,

    /// The detected faces.
    #[serde(default)]
    pub faces: Vec<Face>,
}

/// A single detected face.
#[derive(Debug, Clone, Deserialize)]
pub struct Face {
    /// Estimated age range.
    pub age: Option<FaceAge>,

    /// Estimated gender.
    pub gender: Option<FaceGender>,

    /// Bounding box of the face within the image.
    pub face_location: Option<FaceLocation>,
}

/// Estimated age range with a confidence score.
#[derive(Debug, Clone, Deserialize)]
pub struct FaceAge {
    /// Lower bound of the estimated age.
    pub min: Option<u32>,

    /// Upper bound of the estimated age.
    pub max: Option<u32>,

    /// Confidence in the estimate, 0.0 to 1.0.
    pub score: Option<f32>,
}

/// Estimated gender with a confidence score.
#[derive(Debug, Clone, Deserialize)]
pub struct FaceGender {
    /// The estimated gender label.
    pub gender: String,

    /// Confidence in the estimate, 0.0 to 1.0.
    pub score: Option<f32>,
}

/// Bounding box of a face, in pixels from the top-left corner.
#[derive(Debug, Clone, Deserialize)]
pub struct FaceLocation {
    /// Width of the box.
    pub width: f64,

    /// Height of the box.
    pub height: f64,

    /// Horizontal offset of the box.
    pub left: f64,

    /// Vertical offset of the box.
    pub top: f64,
}

/// A request to detect faces, supplied either as uploaded bytes or as a URL
/// the service fetches.
#[derive(Debug, Clone)]
pub struct DetectFacesRequest {
    image: Option<(String, Bytes)>,
    url: Option<String>,
}

/// Builder for [`DetectFacesRequest`].
#[derive(Debug, Default)]
pub struct DetectFacesRequestBuilder {
    image: Option<(String, Bytes)>,
    url: Option<String>,
}

impl DetectFacesRequest {
    /// Create a new builder for `DetectFacesRequest`.
    pub fn builder() -> DetectFacesRequestBuilder {
        DetectFacesRequestBuilder::default()
    }

    pub(crate) fn to_form(&self) -> reqwest::multipart::Form {
        let mut form = reqwest::multipart::Form::new();
        if let Some(url) = &self.url {
            form = form.text("parameters", serde_json::json!({ "url": url }).to_string());
        }
        if let Some((file_name, data)) = &self.image {
            let part = reqwest::multipart::Part::bytes(data.to_vec())
                .file_name(file_name.clone());
            form = form.part("images_file", part);
        }
        form
    }
}

impl DetectFacesRequestBuilder {
    /// Upload an image (or a zip of up to 15 images) to analyze.
    ///
    /// Either an image or a [`url`](Self::url) is **required**.
    pub fn image(mut self, file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.image = Some((file_name.into(), data.into()));
        self
    }

    /// URL of an image for the service to fetch and analyze.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// Returns an error if neither an image nor a URL was supplied.
    pub fn build(self) -> VisionResult<DetectFacesRequest> {
        if self.image.is_none() && self.url.is_none() {
            return Err(
                CognitiveError::Builder("an image or a url is required".into()).into(),
            );
        }

        Ok(DetectFacesRequest {
            image: self.image,
            url: self.url,
        })
    }
}

/// Detect faces in an image and estimate age and gender for each.
///
/// # Tracing
///
/// Emits a span named `vision::detect_faces`.
#[tracing::instrument(name = "vision::detect_faces", skip(client, request))]
pub async fn detect_faces(
    client: &CognitiveClient,
    request: &DetectFacesRequest,
) -> VisionResult<DetectedFaces> {
    tracing::debug!("detecting faces");

    let response = client
        .post_multipart("/v3/detect_faces", request.to_form())
        .await?;
    let results = response
        .json::<DetectedFaces>()
        .await
        .map_err(CognitiveError::from)?;

    tracing::debug!(images = results.images.len(), "face detection completed");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisionError;
    use crate::test_utils::setup_mock_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn builder_requires_image_or_url() {
        let err = DetectFacesRequest::builder()
            .build()
            .expect_err("should fail");
        assert!(matches!(
            err,
            VisionError::Core(CognitiveError::Builder(_))
        ));
    }

    #[tokio::test]
    async fn detect_faces_parses_results() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3/detect_faces"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "images_processed": 1,
                "images": [{
                    "source_url": "https://example.com/face.jpg",
                    "resolved_url": "https://example.com/face.jpg",
                    "faces": [{
                        "age": {"min": 30, "max": 35, "score": 0.45},
                        "gender": {"gender": "FEMALE", "score": 0.98},
                        "face_location": {
                            "width": 92.0, "height": 112.0, "left": 24.0, "top": 16.0
                        }
                    }]
                }]
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server);
        let request = DetectFacesRequest::builder()
            .url("https://example.com/face.jpg")
            .build()
            .expect("valid request");

        let results = detect_faces(&client, &request).await.expect("should succeed");

        assert_eq!(results.images_processed, Some(1));
        let face = &results.images[0].faces[0];
        assert_eq!(face.age.as_ref().and_then(|a| a.min), Some(30));
        assert_eq!(face.gender.as_ref().map(|g| g.gender.as_str()), Some("FEMALE"));
        let location = face.face_location.as_ref().expect("should have a location");
        assert!(location.width > 90.0);
    }

    #[tokio::test]
    async fn detect_faces_with_no_faces_returns_empty_list() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3/detect_faces"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "images_processed": 1,
                "images": [{"image": "landscape.jpg", "faces": []}]
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server);
        let request = DetectFacesRequest::builder()
            .image("landscape.jpg", vec![0xff, 0xd8, 0xff])
            .build()
            .expect("valid request");

        let results = detect_faces(&client, &request).await.expect("should succeed");
        assert!(results.images[0].faces.is_empty());
    }
}
