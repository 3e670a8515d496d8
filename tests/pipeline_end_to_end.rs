use image::{Rgb, RgbImage};
use tempfile::tempdir;

use platelog::{
    BoundingBox, DetectionPipeline, PlateCandidate, PlateColor, ResultLedger, StubPlateDetector,
    StubTextRecognizer, VehicleCategory, UNKNOWN_TEXT,
};

fn candidate(x1: i32, y1: i32, x2: i32, y2: i32, confidence: f64) -> PlateCandidate {
    PlateCandidate {
        bbox: BoundingBox::new(x1, y1, x2, y2),
        confidence,
    }
}

fn white_image() -> RgbImage {
    RgbImage::from_pixel(64, 32, Rgb([255, 255, 255]))
}

#[test]
fn zero_candidates_yield_empty_result_and_no_ledger() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("results.csv");
    let mut pipeline = DetectionPipeline::new(
        Box::new(StubPlateDetector::fixed(vec![])),
        Box::new(StubTextRecognizer::empty()),
        ResultLedger::new(ledger_path.clone()),
    );

    let records = pipeline.run(&white_image(), "empty.jpg").unwrap();
    assert!(records.is_empty());
    assert!(!ledger_path.exists());
}

#[test]
fn single_candidate_without_text_produces_sentinel_record() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("results.csv");
    let mut pipeline = DetectionPipeline::new(
        Box::new(StubPlateDetector::fixed(vec![candidate(8, 8, 56, 24, 0.873)])),
        Box::new(StubTextRecognizer::empty()),
        ResultLedger::new(ledger_path.clone()),
    );

    let records = pipeline.run(&white_image(), "car.jpg").unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.filename, "car.jpg");
    assert_eq!(record.text, UNKNOWN_TEXT);
    assert_eq!(record.colour, PlateColor::White);
    assert_eq!(record.vehicle_type, VehicleCategory::Private);
    assert_eq!(record.confidence, 0.87);

    let ledger = std::fs::read_to_string(&ledger_path).unwrap();
    let rows: Vec<&str> = ledger.lines().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], "filename,plate_text,colour,vehicle_type,confidence");
    assert_eq!(rows[1], "car.jpg,UNKNOWN,White,Private,0.87");
}

#[test]
fn candidate_order_is_preserved_in_output_and_ledger() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("results.csv");
    let mut pipeline = DetectionPipeline::new(
        Box::new(StubPlateDetector::fixed(vec![
            candidate(0, 0, 30, 16, 0.91),
            candidate(32, 0, 62, 16, 0.42),
        ])),
        Box::new(StubTextRecognizer::reading("KA01AB1234", 0.8)),
        ResultLedger::new(ledger_path.clone()),
    );

    let records = pipeline.run(&white_image(), "two.jpg").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].confidence, 0.91);
    assert_eq!(records[1].confidence, 0.42);
    assert_eq!(records[0].text, "KA01AB1234");

    let ledger = std::fs::read_to_string(&ledger_path).unwrap();
    let rows: Vec<&str> = ledger.lines().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], "two.jpg,KA01AB1234,White,Private,0.91");
    assert_eq!(rows[2], "two.jpg,KA01AB1234,White,Private,0.42");
}

#[test]
fn records_accumulate_across_runs() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("results.csv");

    for (filename, confidence) in [("a.jpg", 0.5), ("b.jpg", 0.995)] {
        let mut pipeline = DetectionPipeline::new(
            Box::new(StubPlateDetector::fixed(vec![candidate(0, 0, 32, 16, confidence)])),
            Box::new(StubTextRecognizer::empty()),
            ResultLedger::new(ledger_path.clone()),
        );
        pipeline.run(&white_image(), filename).unwrap();
    }

    let ledger = std::fs::read_to_string(&ledger_path).unwrap();
    let rows: Vec<&str> = ledger.lines().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], "a.jpg,UNKNOWN,White,Private,0.5");
    // 0.995 rounds down: its binary value sits just below the half.
    assert_eq!(rows[2], "b.jpg,UNKNOWN,White,Private,0.99");
}

#[test]
fn yellow_plate_maps_to_commercial() {
    let dir = tempdir().unwrap();
    let image = RgbImage::from_pixel(64, 32, Rgb([255, 255, 0]));
    let mut pipeline = DetectionPipeline::new(
        Box::new(StubPlateDetector::fixed(vec![candidate(0, 0, 64, 32, 0.6)])),
        Box::new(StubTextRecognizer::empty()),
        ResultLedger::new(dir.path().join("results.csv")),
    );

    let records = pipeline.run(&image, "taxi.jpg").unwrap();
    assert_eq!(records[0].colour, PlateColor::Yellow);
    assert_eq!(records[0].vehicle_type, VehicleCategory::Commercial);
}
