#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from driver_distraction for tests
pub use driver_distraction::config::{COLOR_LEN, FEATURE_LEN, HOG_LEN, LBP_LEN};
pub use driver_distraction::inference::{
    Classifier, FeatureSelector, Kernel, PcaReducer, PlattScaling, StandardScaler, SvcModel,
};
pub use driver_distraction::{
    ClassifyError, FrameClassifier, FrameOrchestrator, FrameStatus, Pipeline, PipelineBundle,
    PredictionResult, CLASS_NAMES,
};
