use driver_distraction::config::{FEATURE_LEN, HOG_LEN};
use driver_distraction::inference::{Classifier, FeatureSelector, StandardScaler};
use driver_distraction::models::{default_class_names, CLASS_COUNT};
use driver_distraction::{
    ClassifyError, FrameClassifier, JsonBundleFile, PipelineBundle, PredictionResult,
};
use image::{DynamicImage, ImageBuffer, Rgb};
use std::cell::Cell;
use tempfile::NamedTempFile;

/// RGB gradient with a bright square, so every descriptor sees structure
pub fn test_image(width: u32, height: u32) -> DynamicImage {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let inside = x > width / 3 && x < 2 * width / 3 && y > height / 3 && y < 2 * height / 3;
        if inside {
            Rgb([250u8, 240, 30])
        } else {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            Rgb([r, g, 128])
        }
    });
    DynamicImage::ImageRgb8(img)
}

pub fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(color)))
}

/// PNG encoding of `test_image`
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    test_image(width, height)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes.into_inner()
}

/// Indices spread over the gradient, color and texture sections
pub fn sample_support() -> Vec<usize> {
    vec![
        0,
        1,
        500,
        HOG_LEN - 1,
        HOG_LEN,
        HOG_LEN + 24,
        FEATURE_LEN - 10,
        FEATURE_LEN - 1,
    ]
}

fn weights(rows: usize, cols: usize) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|k| {
            (0..cols)
                .map(|i| ((k * 7 + i * 3) % 11) as f64 - 5.0)
                .collect()
        })
        .collect()
}

fn selector_and_scaler() -> (FeatureSelector, StandardScaler) {
    let support = sample_support();
    let n = support.len();
    let selector = FeatureSelector {
        n_features_in: FEATURE_LEN,
        support,
    };
    let scaler = StandardScaler {
        mean: vec![0.1; n],
        scale: vec![0.5; n],
    };
    (selector, scaler)
}

/// Selector + scaler + linear model without probability estimates
pub fn linear_bundle() -> PipelineBundle {
    let (selector, scaler) = selector_and_scaler();
    let n = selector.support.len();
    PipelineBundle {
        model: Classifier::Linear {
            coef: weights(CLASS_COUNT, n),
            intercept: (0..CLASS_COUNT).map(|k| k as f64 * 0.01).collect(),
        },
        scaler: Some(scaler),
        feature_selector: Some(selector),
        pca: None,
        class_names: default_class_names(),
    }
}

/// Same transforms with a probabilistic model
pub fn logistic_bundle() -> PipelineBundle {
    let (selector, scaler) = selector_and_scaler();
    let n = selector.support.len();
    PipelineBundle {
        model: Classifier::Logistic {
            coef: weights(CLASS_COUNT, n),
            intercept: vec![0.0; CLASS_COUNT],
        },
        scaler: Some(scaler),
        feature_selector: Some(selector),
        pca: None,
        class_names: default_class_names(),
    }
}

pub fn linear_pipeline() -> driver_distraction::Pipeline {
    driver_distraction::Pipeline::new(linear_bundle()).expect("fixture bundle is valid")
}

/// Writes the bundle as JSON; keep the file alive while loading
pub fn bundle_file(bundle: &PipelineBundle) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create temp bundle file");
    JsonBundleFile::new(file.path())
        .save(bundle)
        .expect("Failed to write bundle");
    file
}

/// Fake classifier that counts calls and fails on 1-pixel-wide frames
#[derive(Default)]
pub struct CountingClassifier {
    pub calls: Cell<usize>,
}

impl FrameClassifier for CountingClassifier {
    fn classify_frame(&self, frame: &DynamicImage) -> Result<PredictionResult, ClassifyError> {
        self.calls.set(self.calls.get() + 1);
        if frame.width() == 1 {
            return Err(ClassifyError::FeatureExtraction {
                descriptor: "gradient",
            });
        }
        let call = self.calls.get();
        Ok(PredictionResult {
            class_id: call % CLASS_COUNT,
            label: format!("call {}", call),
            confidence: None,
        })
    }
}

pub fn good_frame() -> DynamicImage {
    solid_image(8, 6, [10, 20, 30])
}

pub fn corrupt_frame() -> DynamicImage {
    solid_image(1, 1, [0, 0, 0])
}
