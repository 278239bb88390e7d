//! Per-frame orchestration for video input.
//!
//! Every incoming frame bumps a counter; only frames whose counter is a
//! multiple of the skip interval are classified, the rest reuse the last
//! status. A failed classification becomes the displayed status and the
//! stream carries on.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::num::NonZeroU32;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ClassifyError;
use crate::models::PredictionResult;

/// Anything that can label a single decoded frame
pub trait FrameClassifier {
    fn classify_frame(&self, frame: &DynamicImage) -> Result<PredictionResult, ClassifyError>;
}

impl<T: FrameClassifier + ?Sized> FrameClassifier for &T {
    fn classify_frame(&self, frame: &DynamicImage) -> Result<PredictionResult, ClassifyError> {
        (**self).classify_frame(frame)
    }
}

/// What is currently shown for the stream
#[derive(Debug, Clone, PartialEq)]
pub enum FrameStatus {
    Initializing,
    Predicted(PredictionResult),
    Failed(String),
}

impl FrameStatus {
    pub fn from_error(err: &ClassifyError) -> Self {
        match err {
            ClassifyError::FeatureExtraction { .. } => FrameStatus::Failed(err.user_message()),
            other => FrameStatus::Failed(format!("Error: {}", other)),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            FrameStatus::Initializing => "Initializing...",
            FrameStatus::Predicted(prediction) => prediction.label.as_str(),
            FrameStatus::Failed(message) => message.as_str(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FrameStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    /// Frame fell between samples; last status reused
    Skipped,
    Classified,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// 1-based position in the stream
    pub frame_number: u64,
    pub action: FrameAction,
    pub status: FrameStatus,
    /// Text drawn over the frame
    pub overlay: String,
}

impl FrameReport {
    pub fn classified(&self) -> bool {
        self.action == FrameAction::Classified
    }
}

#[derive(Debug, Clone)]
pub struct StreamState {
    pub last: FrameStatus,
    pub frame_count: u64,
    pub skip_interval: NonZeroU32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    pub frames: u64,
    pub classified: u64,
    pub failed: u64,
    pub last_status: FrameStatus,
}

pub struct FrameOrchestrator<C> {
    classifier: C,
    state: StreamState,
    classified: u64,
    failed: u64,
    ended: bool,
}

impl<C: FrameClassifier> FrameOrchestrator<C> {
    pub fn new(classifier: C, skip_interval: NonZeroU32) -> Self {
        Self {
            classifier,
            state: StreamState {
                last: FrameStatus::Initializing,
                frame_count: 0,
                skip_interval,
            },
            classified: 0,
            failed: 0,
            ended: false,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn advance(&mut self, frame: &DynamicImage) -> FrameReport {
        self.advance_frame(Ok(frame))
    }

    /// Handle one frame. A frame the source could not decode arrives as
    /// `Err` and is treated like any other classification failure.
    pub fn advance_frame(&mut self, frame: Result<&DynamicImage, ClassifyError>) -> FrameReport {
        self.state.frame_count += 1;
        let frame_number = self.state.frame_count;
        let sampled = frame_number % u64::from(self.state.skip_interval.get()) == 0;

        let action = if sampled {
            self.classified += 1;
            let result = frame.and_then(|f| self.classifier.classify_frame(f));
            self.state.last = match result {
                Ok(prediction) => {
                    debug!(frame = frame_number, label = %prediction.label, "classified frame");
                    FrameStatus::Predicted(prediction)
                }
                Err(e) => {
                    warn!(frame = frame_number, error = %e, "frame classification failed");
                    self.failed += 1;
                    FrameStatus::from_error(&e)
                }
            };
            FrameAction::Classified
        } else {
            FrameAction::Skipped
        };

        FrameReport {
            frame_number,
            action,
            overlay: format!("Status: {}", self.state.last.text()),
            status: self.state.last.clone(),
        }
    }

    /// Drive the orchestrator until the frame source is exhausted
    pub fn run<I, F>(&mut self, frames: I, mut on_frame: F) -> StreamSummary
    where
        I: IntoIterator<Item = Result<DynamicImage, ClassifyError>>,
        F: FnMut(Option<&DynamicImage>, &FrameReport),
    {
        for frame in frames {
            match frame {
                Ok(img) => {
                    let report = self.advance(&img);
                    on_frame(Some(&img), &report);
                }
                Err(e) => {
                    let report = self.advance_frame(Err(e));
                    on_frame(None, &report);
                }
            }
        }
        self.finish()
    }

    /// Mark the stream ended and summarize it
    pub fn finish(&mut self) -> StreamSummary {
        self.ended = true;
        StreamSummary {
            frames: self.state.frame_count,
            classified: self.classified,
            failed: self.failed,
            last_status: self.state.last.clone(),
        }
    }
}

/// Copy of the frame with a status banner across the top:
/// green for a prediction, red for an error, grey before the first sample
pub fn annotate(frame: &DynamicImage, report: &FrameReport) -> RgbImage {
    let mut img = frame.to_rgb8();
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img;
    }

    let color = match report.status {
        FrameStatus::Predicted(_) => Rgb([0u8, 160, 0]),
        FrameStatus::Failed(_) => Rgb([220u8, 0, 0]),
        FrameStatus::Initializing => Rgb([128u8, 128, 128]),
    };
    let banner = (height / 12).max(4).min(height);
    draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(width, banner), color);
    img
}

/// Output directories must be empty or absent; created if absent
pub fn prepare_output_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() {
        let entries = std::fs::read_dir(dir)?;
        if entries.count() > 0 {
            return Err(anyhow::anyhow!(
                "Output directory is not empty: {}",
                dir.display()
            ));
        }
    } else {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
