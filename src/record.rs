//! Detection audit records.

use serde::Serialize;

use crate::colour::{vehicle_category, PlateColor, VehicleCategory};

/// Sentinel written when the recognizer returns no text hypothesis.
pub const UNKNOWN_TEXT: &str = "UNKNOWN";

/// One plate detection, immutable once built. Appended exactly once to the
/// ledger and returned exactly once in the pipeline's output sequence.
///
/// The JSON projection matches the transport contract
/// `{text, colour, vehicle_type, confidence}`; the source filename only
/// appears in ledger rows.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionRecord {
    #[serde(skip)]
    pub filename: String,
    pub text: String,
    pub colour: PlateColor,
    pub vehicle_type: VehicleCategory,
    pub confidence: f64,
}

impl DetectionRecord {
    /// Builds a record from one candidate's outputs. The confidence is
    /// rounded to two decimals here, at construction time; a missing
    /// recognizer result becomes the `UNKNOWN` sentinel. Filename content is
    /// passed through unvalidated.
    pub fn new(
        filename: &str,
        confidence: f64,
        text: Option<String>,
        colour: PlateColor,
    ) -> Self {
        Self {
            filename: filename.to_string(),
            text: text.unwrap_or_else(|| UNKNOWN_TEXT.to_string()),
            colour,
            vehicle_type: vehicle_category(colour),
            confidence: round2(confidence),
        }
    }
}

/// Rounds to two decimals with `f64::round` (half away from zero over the
/// binary value, so `0.995` lands on `0.99` while `0.875` lands on `0.88`).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
