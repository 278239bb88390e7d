//! Integration tests for the transform chain.
//!
//! Tests cover:
//! - Stage order selector, scaler, reducer
//! - Absent stages passing vectors through
//! - Shape mismatches naming expected and actual lengths
//! - PCA projection with and without whitening

mod common;

use driver_distraction::models::CLASS_COUNT;
use driver_distraction::{TransformChain, TransformStep};

use common::*;

fn small_selector() -> FeatureSelector {
    FeatureSelector {
        n_features_in: 4,
        support: vec![1, 3],
    }
}

fn small_scaler() -> StandardScaler {
    StandardScaler {
        mean: vec![1.0, 2.0],
        scale: vec![2.0, 4.0],
    }
}

#[test]
fn test_bundle_chain_runs_selector_scaler_reducer() -> anyhow::Result<()> {
    let mut bundle = linear_bundle();
    let mut last = vec![0.0; 8];
    last[7] = 1.0;
    let mut first = vec![0.0; 8];
    first[0] = 1.0;
    bundle.pca = Some(PcaReducer {
        mean: vec![0.0; 8],
        components: vec![first, last],
        explained_variance: vec![4.0, 1.0],
        whiten: true,
    });
    let mut coef = vec![vec![0.0, 0.0]; CLASS_COUNT];
    coef[3] = vec![1.0, 0.0];
    let mut intercept = vec![0.0; CLASS_COUNT];
    intercept[5] = 1.5;
    bundle.model = Classifier::Linear { coef, intercept };

    let chain = bundle.transform_chain();
    assert_eq!(chain.step_names(), vec!["feature selector", "scaler", "pca"]);

    let mut features = vec![0.0; FEATURE_LEN];
    features[0] = 2.1;
    features[FEATURE_LEN - 1] = 0.1;

    // selected [2.1, 0, .., 0.1] -> scaled [4.0, -0.2, .., 0.0] -> whitened [2.0, 0.0]
    let transformed = chain.apply(&features)?;
    assert_eq!(transformed.len(), 2);
    assert!((transformed[0] - 2.0).abs() < 1e-12);
    assert!(transformed[1].abs() < 1e-12);

    let pipeline = Pipeline::new(bundle.clone())?;
    let prediction = pipeline.classify_features(&features)?;
    assert_eq!(prediction.class_id, 3);
    assert_eq!(prediction.label, CLASS_NAMES[3]);
    assert_eq!(prediction.confidence, None);

    // Without the scaler the first component drops below class 5's intercept
    bundle.scaler = None;
    let unscaled = bundle.transform_chain().apply(&features)?;
    assert!((unscaled[0] - 1.05).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_selector_runs_before_scaler() -> anyhow::Result<()> {
    let selector = small_selector();
    let scaler = small_scaler();
    let input = [10.0, 20.0, 30.0, 40.0];

    let chain = TransformChain::new()
        .with_step(Some(&selector as &dyn TransformStep))
        .with_step(Some(&scaler as &dyn TransformStep));
    assert_eq!(chain.apply(&input)?, vec![9.5, 9.5]);

    // The scaler was fitted on selected features only, so running it first
    // cannot produce the same result
    let reversed = TransformChain::new()
        .with_step(Some(&scaler as &dyn TransformStep))
        .with_step(Some(&selector as &dyn TransformStep));
    let err = reversed.apply(&input).expect_err("reversed chain must fail");
    assert!(matches!(
        err,
        ClassifyError::ShapeMismatch {
            stage: "scaler",
            expected: 2,
            actual: 4
        }
    ));
    Ok(())
}

#[test]
fn test_reordered_stages_change_values() -> anyhow::Result<()> {
    // Scaler fitted on all four inputs, selector keeps two of them
    let selector = small_selector();
    let wide_scaler = StandardScaler {
        mean: vec![0.0, 5.0, 0.0, 10.0],
        scale: vec![1.0, 5.0, 1.0, 10.0],
    };
    let input = [10.0, 20.0, 30.0, 40.0];

    let scaled_then_selected = TransformChain::new()
        .with_step(Some(&wide_scaler as &dyn TransformStep))
        .with_step(Some(&selector as &dyn TransformStep))
        .apply(&input)?;
    assert_eq!(scaled_then_selected, vec![3.0, 3.0]);

    let selected_first = TransformChain::new()
        .with_step(Some(&selector as &dyn TransformStep))
        .with_step(Some(&wide_scaler as &dyn TransformStep))
        .apply(&input);
    assert!(selected_first.is_err());
    Ok(())
}

#[test]
fn test_absent_stages_pass_through() -> anyhow::Result<()> {
    let chain = TransformChain::new().with_step(None).with_step(None);
    assert!(chain.is_empty());
    assert_eq!(chain.apply(&[1.0, 2.0])?, vec![1.0, 2.0]);
    assert_eq!(chain.output_len(7)?, 7);
    Ok(())
}

#[test]
fn test_shape_mismatch_names_lengths() {
    let selector = small_selector();
    let err = selector.apply(&[1.0, 2.0, 3.0]).expect_err("wrong length");
    let message = err.to_string();
    assert!(message.contains("feature selector"));
    assert!(message.contains("expected 4"));
    assert!(message.contains("got 3"));
}

#[test]
fn test_chain_output_len_checks_adjacent_stages() {
    let selector = small_selector();
    let scaler = small_scaler();
    let chain = TransformChain::new()
        .with_step(Some(&selector as &dyn TransformStep))
        .with_step(Some(&scaler as &dyn TransformStep));

    assert_eq!(chain.output_len(4).ok(), Some(2));
    assert!(chain.output_len(5).is_err());
}

#[test]
fn test_pca_projection_and_whitening() -> anyhow::Result<()> {
    let mut pca = PcaReducer {
        mean: vec![1.0, 1.0],
        components: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        explained_variance: vec![4.0, 1.0],
        whiten: false,
    };
    pca.validate()?;
    assert_eq!(pca.apply(&[3.0, 3.0])?, vec![2.0, 2.0]);

    pca.whiten = true;
    assert_eq!(pca.apply(&[3.0, 3.0])?, vec![1.0, 2.0]);
    Ok(())
}

#[test]
fn test_zero_scale_is_treated_as_one() -> anyhow::Result<()> {
    let mut scaler = StandardScaler {
        mean: vec![1.0, 1.0],
        scale: vec![0.0, 2.0],
    };
    scaler.validate()?;
    assert_eq!(scaler.apply(&[3.0, 3.0])?, vec![2.0, 1.0]);
    Ok(())
}

#[test]
fn test_selector_validation() {
    let unordered = FeatureSelector {
        n_features_in: 4,
        support: vec![3, 1],
    };
    assert!(matches!(unordered.validate(), Err(ClassifyError::InvalidBundle(_))));

    let out_of_range = FeatureSelector {
        n_features_in: 4,
        support: vec![1, 4],
    };
    assert!(matches!(out_of_range.validate(), Err(ClassifyError::InvalidBundle(_))));
}

#[test]
fn test_unvalidated_selector_reports_out_of_range_index() {
    let selector = FeatureSelector {
        n_features_in: 4,
        support: vec![1, 7],
    };
    let err = selector
        .apply(&[1.0, 2.0, 3.0, 4.0])
        .expect_err("index 7 of 4 inputs");
    assert!(matches!(
        err,
        ClassifyError::ShapeMismatch {
            stage: "feature selector",
            expected: 8,
            actual: 4
        }
    ));
}

#[test]
fn test_scaler_with_uneven_parameters_is_rejected() {
    let scaler = StandardScaler {
        mean: vec![0.0; 4],
        scale: vec![1.0; 2],
    };
    let err = scaler.apply(&[1.0, 2.0, 3.0, 4.0]).expect_err("two scales for four means");
    assert!(matches!(
        err,
        ClassifyError::ShapeMismatch {
            stage: "scaler",
            expected: 4,
            actual: 2
        }
    ));
}

#[test]
fn test_pca_with_missing_parameters_is_rejected() {
    let whitening = PcaReducer {
        mean: vec![0.0, 0.0],
        components: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        explained_variance: vec![1.0],
        whiten: true,
    };
    assert!(matches!(
        whitening.apply(&[1.0, 1.0]),
        Err(ClassifyError::ShapeMismatch { stage: "pca", .. })
    ));

    let short_row = PcaReducer {
        mean: vec![0.0, 0.0],
        components: vec![vec![1.0]],
        explained_variance: vec![],
        whiten: false,
    };
    assert!(matches!(
        short_row.apply(&[1.0, 1.0]),
        Err(ClassifyError::ShapeMismatch { stage: "pca", .. })
    ));
}
