pub mod bundle;
pub mod classifier;
pub mod steps;

pub use bundle::{BundleProvider, JsonBundleFile, PipelineBundle};
pub use classifier::{Classifier, Kernel, PlattScaling, Prediction, SvcModel};
pub use steps::{FeatureSelector, PcaReducer, StandardScaler};
