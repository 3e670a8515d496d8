//! Detection-to-record pipeline.
//!
//! One `run` processes one image to completion: the injected detector yields
//! candidate regions, and each candidate is cropped, read, colour-classified,
//! recorded, and appended to the ledger before the next one starts. All
//! collaborators are constructor-injected so tests can substitute any of
//! them.

use image::{imageops, RgbImage};

use crate::colour::classify_colour;
use crate::detect::{BoundingBox, PlateDetector, TextRecognizer};
use crate::error::{Error, Result};
use crate::ledger::ResultLedger;
use crate::record::DetectionRecord;

pub struct DetectionPipeline {
    detector: Box<dyn PlateDetector>,
    recognizer: Box<dyn TextRecognizer>,
    ledger: ResultLedger,
}

impl DetectionPipeline {
    pub fn new(
        detector: Box<dyn PlateDetector>,
        recognizer: Box<dyn TextRecognizer>,
        ledger: ResultLedger,
    ) -> Self {
        Self {
            detector,
            recognizer,
            ledger,
        }
    }

    pub fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    /// Runs detection on one image and returns the records in candidate
    /// order. Zero candidates is a valid empty result with no ledger writes.
    ///
    /// Failure policy: a detector failure aborts the run; a recognizer
    /// failure skips that candidate; a ledger append failure aborts the run
    /// (rows already appended stay in the ledger).
    pub fn run(&mut self, image: &RgbImage, filename: &str) -> Result<Vec<DetectionRecord>> {
        let candidates = self.detector.detect(image).map_err(Error::Model)?;
        log::info!(
            "{}: {} plate candidate(s) from detector '{}'",
            filename,
            candidates.len(),
            self.detector.name()
        );

        let mut records = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let Some(plate) = crop_candidate(image, &candidate.bbox) else {
                log::warn!(
                    "{}: skipping candidate with empty region after clamping ({:?})",
                    filename,
                    candidate.bbox
                );
                continue;
            };

            let text = match self.recognizer.recognize(&plate) {
                Ok(hypotheses) => hypotheses.into_iter().next().map(|h| h.text),
                Err(err) => {
                    log::warn!(
                        "{}: recognizer '{}' failed on candidate {:?}: {}",
                        filename,
                        self.recognizer.name(),
                        candidate.bbox,
                        err
                    );
                    continue;
                }
            };

            let colour = classify_colour(&plate);
            let record = DetectionRecord::new(filename, candidate.confidence, text, colour);
            self.ledger.append(&record)?;
            records.push(record);
        }
        Ok(records)
    }
}

/// Clamps the box to the image bounds and crops. Returns `None` when nothing
/// remains, so degenerate detector output never reaches OCR or the colour
/// classifier.
fn crop_candidate(image: &RgbImage, bbox: &BoundingBox) -> Option<RgbImage> {
    let (width, height) = (image.width() as i64, image.height() as i64);
    let x1 = i64::from(bbox.x1).clamp(0, width);
    let y1 = i64::from(bbox.y1).clamp(0, height);
    let x2 = i64::from(bbox.x2).clamp(0, width);
    let y2 = i64::from(bbox.y2).clamp(0, height);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(
        imageops::crop_imm(
            image,
            x1 as u32,
            y1 as u32,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
        )
        .to_image(),
    )
}
