//! # Cognitive AI Vision
//!
//! Visual recognition client for the Cognitive AI Rust SDK.
//!
//! This crate provides Rust bindings for the visual recognition service:
//! classifying images, detecting faces, and training custom classifiers
//! from zipped example images.
//!
//! ## Core Concepts
//!
//! - **Classifier**: a remotely trained model identified by an opaque id,
//!   with a service-managed status (`training`, `ready`, `failed`, ...).
//! - **Training workflow**: classifier creation and retraining are
//!   asynchronous jobs. The [`training`] module submits them with a bounded
//!   [`RetryBudget`](training::RetryBudget) and polls until the classifier
//!   reaches a terminal status.
//! - **Artifacts**: once a classifier is ready, its Core ML model can be
//!   downloaded for on-device inference.
//!
//! ## Modules
//!
//! - [`classifier`] - Create, retrieve, list, update, and delete classifiers
//! - [`training`] - Submit-with-retry and poll-until-ready workflow
//! - [`classify`] - Classify images against built-in or custom classifiers
//! - [`faces`] - Detect faces in images
//! - [`models`] - Shared response types

pub mod classifier;
pub mod classify;
pub mod error;
pub mod faces;
pub mod models;
pub mod training;

pub use error::{VisionError, VisionResult};
