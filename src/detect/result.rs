/// Plate region corners in image pixel coordinates, as reported by a
/// detector: `(x1, y1)` top-left, `(x2, y2)` bottom-right, `x1 < x2`,
/// `y1 < y2`. Model outputs may land slightly outside the image; the
/// pipeline clamps before cropping. Boxes are never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// One detector-reported plate region with its confidence in [0, 1].
/// Candidates keep detector order; the pipeline never re-sorts them.
#[derive(Clone, Debug)]
pub struct PlateCandidate {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

/// One recognizer text hypothesis. The pipeline only consumes the first
/// entry of a recognizer's output; ranking is recognizer-internal.
#[derive(Clone, Debug)]
pub struct TextCandidate {
    pub text: String,
    pub score: f64,
}
