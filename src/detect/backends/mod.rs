pub mod stub;

pub use stub::{StubPlateDetector, StubTextRecognizer};
