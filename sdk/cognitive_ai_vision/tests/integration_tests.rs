//! Integration tests for cognitive_ai_vision.
//!
//! These tests require a live visual recognition endpoint and train real
//! classifiers, which can take several minutes.
//! Run with: `cargo test --features integration-tests`
//!
//! Required environment variables:
//! - `COGNITIVE_AI_ENDPOINT`: The service endpoint URL
//! - `COGNITIVE_AI_API_KEY`: The API key for authentication
//! - `COGNITIVE_AI_POSITIVE_ZIP`: Path to a zip of positive example images
//! - `COGNITIVE_AI_NEGATIVE_ZIP`: Path to a zip of negative example images

#![cfg(feature = "integration-tests")]

use cognitive_ai_core::auth::ServiceCredential;
use cognitive_ai_core::client::CognitiveClient;
use cognitive_ai_vision::classifier::{
    ClassifierStatus, CreateClassifierRequest, UpdateClassifierRequest,
};
use cognitive_ai_vision::classify::ClassifyRequest;
use cognitive_ai_vision::training::{self, PollOptions, RetryBudget};
use cognitive_ai_vision::{classifier, classify};
use std::time::Duration;

fn get_client() -> CognitiveClient {
    let endpoint =
        std::env::var("COGNITIVE_AI_ENDPOINT").expect("COGNITIVE_AI_ENDPOINT not set");
    let api_key = std::env::var("COGNITIVE_AI_API_KEY").expect("COGNITIVE_AI_API_KEY not set");

    CognitiveClient::builder()
        .endpoint(endpoint)
        .credential(ServiceCredential::api_key(api_key))
        .build()
        .expect("Failed to build client")
}

fn read_fixture(var: &str) -> Vec<u8> {
    let path = std::env::var(var).unwrap_or_else(|_| panic!("{var} not set"));
    std::fs::read(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

fn poll_options() -> PollOptions {
    PollOptions {
        interval: Duration::from_secs(10),
        max_attempts: 120,
    }
}

#[tokio::test]
async fn test_classifier_training_lifecycle() {
    let client = get_client();
    let positive = read_fixture("COGNITIVE_AI_POSITIVE_ZIP");
    let negative = read_fixture("COGNITIVE_AI_NEGATIVE_ZIP");

    // Create a classifier with bounded submission retries
    let request = CreateClassifierRequest::builder()
        .name("integration-test-dogs")
        .positive_examples("beagle", positive.clone())
        .negative_examples(negative.clone())
        .build()
        .expect("valid request");

    let created = training::submit(&client, &request, RetryBudget::new(3))
        .await
        .expect("create classifier");
    assert!(!created.classifier_id.is_empty());
    assert!(!created.status.is_terminal());

    // Poll until training converges
    let trained = training::await_ready(&client, &created.classifier_id, &poll_options())
        .await
        .expect("poll classifier");
    assert_eq!(trained.status, ClassifierStatus::Ready);

    // Retrain with more examples
    let update = UpdateClassifierRequest::builder()
        .positive_examples("husky", positive)
        .build()
        .expect("valid request");

    let retrained = training::retrain(
        &client,
        &created.classifier_id,
        &update,
        RetryBudget::new(3),
    )
    .await
    .expect("retrain classifier");
    assert!(!retrained.status.is_terminal() || retrained.status == ClassifierStatus::Ready);

    let retrained = training::await_ready(&client, &created.classifier_id, &poll_options())
        .await
        .expect("poll retrained classifier");
    assert_eq!(retrained.status, ClassifierStatus::Ready);

    // Download the Core ML artifact
    let model = classifier::core_ml_model(&client, &retrained)
        .await
        .expect("download core ml model");
    assert!(!model.is_empty());

    // List should include our classifier
    let listing = classifier::list(&client, false)
        .await
        .expect("list classifiers");
    assert!(listing
        .classifiers
        .iter()
        .any(|c| c.classifier_id == created.classifier_id));

    // Cleanup
    classifier::delete(&client, &created.classifier_id)
        .await
        .expect("delete classifier");
}

#[tokio::test]
async fn test_classify_by_url() {
    let client = get_client();

    let request = ClassifyRequest::builder()
        .url("https://upload.wikimedia.org/wikipedia/commons/b/bd/Golden_Retriever_Dukedestiny01_drvd.jpg")
        .threshold(0.5)
        .build()
        .expect("valid request");

    let results = classify::classify(&client, &request)
        .await
        .expect("classify image");

    assert_eq!(results.images.len(), 1);
    let image = &results.images[0];
    assert!(image.error.is_none());
    assert!(!image.classifiers.is_empty());
    assert!(!image.classifiers[0].classes.is_empty());
}
