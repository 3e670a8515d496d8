pub mod backend;
pub mod backends;
pub mod result;

pub use backend::{PlateDetector, TextRecognizer};
pub use result::{BoundingBox, PlateCandidate, TextCandidate};
