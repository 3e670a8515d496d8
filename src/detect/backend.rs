use anyhow::Result;
use image::RgbImage;

use crate::detect::result::{PlateCandidate, TextCandidate};

/// Plate-locating model backend.
///
/// The pipeline depends on nothing beyond "boxes with scores": any model
/// backend can sit behind this trait. Candidate order is backend-defined
/// and preserved downstream.
pub trait PlateDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Locate plate candidates in a full vehicle image.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<PlateCandidate>>;
}

/// Text-reading model backend.
///
/// Receives one cropped plate region and returns zero or more ranked text
/// hypotheses. An empty result is valid and maps to the sentinel text.
pub trait TextRecognizer: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Read text from a cropped plate region.
    fn recognize(&mut self, plate: &RgbImage) -> Result<Vec<TextCandidate>>;
}
