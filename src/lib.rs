pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod stream;

pub use error::ClassifyError;
pub use features::extract_features;
pub use inference::{BundleProvider, Classifier, JsonBundleFile, PipelineBundle};
pub use models::{FeatureVector, InferenceResponse, PredictionResult, CLASS_NAMES};
pub use pipeline::{Pipeline, TransformChain, TransformStep};
pub use stream::{FrameClassifier, FrameOrchestrator, FrameReport, FrameStatus, StreamSummary};
