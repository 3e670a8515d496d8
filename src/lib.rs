//! platelog
//!
//! License-plate detection pipeline with a durable audit trail. Given a
//! vehicle image and an external plate detector, the pipeline crops each
//! candidate region, reads the plate text through an external recognizer,
//! classifies the plate background colour, derives a vehicle category, and
//! appends every detection to an append-only CSV ledger before returning it.
//!
//! # Module Structure
//!
//! - `detect`: detector/recognizer capability traits, candidate types, stubs
//! - `colour`: HSV pixel-mass colour classifier and the category table
//! - `record`: immutable detection records
//! - `ledger`: append-only CSV result log
//! - `pipeline`: per-image orchestration with injected collaborators
//! - `api`: HTTP boundary (submit image / download ledger)
//! - `config`: service configuration (JSON file + env overrides)

pub mod api;
pub mod colour;
pub mod config;
pub mod detect;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod record;

pub use colour::{classify_colour, vehicle_category, PlateColor, VehicleCategory};
pub use detect::backends::{StubPlateDetector, StubTextRecognizer};
pub use detect::{BoundingBox, PlateCandidate, PlateDetector, TextCandidate, TextRecognizer};
pub use error::Error;
pub use ledger::{ResultLedger, LEDGER_HEADER};
pub use pipeline::DetectionPipeline;
pub use record::{DetectionRecord, UNKNOWN_TEXT};
