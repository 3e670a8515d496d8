//! Deterministic stub backends.
//!
//! Used by tests and by model-free runs: the stub detector reports one
//! candidate covering the central region of the image, the stub recognizer
//! replays a scripted text list (empty by default).

use anyhow::Result;
use image::RgbImage;

use crate::detect::backend::{PlateDetector, TextRecognizer};
use crate::detect::result::{BoundingBox, PlateCandidate, TextCandidate};

const CENTERED_CONFIDENCE: f64 = 0.85;

/// Stub detector. Either replays a fixed candidate list or synthesizes one
/// centered box per image.
pub struct StubPlateDetector {
    candidates: Option<Vec<PlateCandidate>>,
}

impl StubPlateDetector {
    /// One synthesized candidate spanning the central half of each image.
    pub fn centered() -> Self {
        Self { candidates: None }
    }

    /// Replay exactly these candidates for every image.
    pub fn fixed(candidates: Vec<PlateCandidate>) -> Self {
        Self {
            candidates: Some(candidates),
        }
    }
}

impl PlateDetector for StubPlateDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, image: &RgbImage) -> Result<Vec<PlateCandidate>> {
        if let Some(candidates) = &self.candidates {
            return Ok(candidates.clone());
        }
        let (w, h) = (image.width() as i32, image.height() as i32);
        Ok(vec![PlateCandidate {
            bbox: BoundingBox::new(w / 4, h / 4, (w * 3) / 4, (h * 3) / 4),
            confidence: CENTERED_CONFIDENCE,
        }])
    }
}

/// Stub recognizer replaying a scripted hypothesis list.
pub struct StubTextRecognizer {
    texts: Vec<TextCandidate>,
}

impl StubTextRecognizer {
    /// Recognizer that never finds text.
    pub fn empty() -> Self {
        Self { texts: Vec::new() }
    }

    /// Recognizer returning one fixed hypothesis for every crop.
    pub fn reading(text: &str, score: f64) -> Self {
        Self {
            texts: vec![TextCandidate {
                text: text.to_string(),
                score,
            }],
        }
    }
}

impl TextRecognizer for StubTextRecognizer {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn recognize(&mut self, _plate: &RgbImage) -> Result<Vec<TextCandidate>> {
        Ok(self.texts.clone())
    }
}
