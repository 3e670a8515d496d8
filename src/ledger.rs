//! Append-only CSV audit ledger.
//!
//! The ledger is a flat tabular file with a fixed five-column header and one
//! row per detection, in creation order. Rows are never rewritten or
//! reordered. Every append opens the file, writes one row, flushes, and
//! closes it, so a crash between appends loses at most the in-flight row.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::record::DetectionRecord;

/// Fixed header row; always the first line of the ledger file.
pub const LEDGER_HEADER: [&str; 5] =
    ["filename", "plate_text", "colour", "vehicle_type", "confidence"];

pub struct ResultLedger {
    path: PathBuf,
}

impl ResultLedger {
    /// The ledger file is created lazily on first use; constructing the
    /// handle touches nothing on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the ledger with its header iff it does not exist. Idempotent:
    /// an existing file is left byte-identical. `create_new` makes the
    /// create/create race safe; the loser of the race sees `AlreadyExists`
    /// and does nothing.
    pub fn ensure_initialized(&self) -> Result<()> {
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(()),
            Err(err) => return Err(Error::Ledger(err)),
        };
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(LEDGER_HEADER)?;
        writer.flush().map_err(Error::Ledger)?;
        Ok(())
    }

    /// Durably appends one record as one row in the fixed field order.
    pub fn append(&self, record: &DetectionRecord) -> Result<()> {
        self.ensure_initialized()?;
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(Error::Ledger)?;
        let mut writer = csv::Writer::from_writer(file);
        let confidence = record.confidence.to_string();
        writer.write_record([
            record.filename.as_str(),
            record.text.as_str(),
            record.colour.as_str(),
            record.vehicle_type.as_str(),
            confidence.as_str(),
        ])?;
        writer.flush().map_err(Error::Ledger)?;
        Ok(())
    }

    /// Returns the ledger file verbatim, or `LedgerNotFound` if no detection
    /// has ever been recorded.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::LedgerNotFound),
            Err(err) => Err(Error::Ledger(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::PlateColor;
    use tempfile::tempdir;

    fn record(filename: &str, text: &str, confidence: f64) -> DetectionRecord {
        DetectionRecord::new(filename, confidence, Some(text.to_string()), PlateColor::White)
    }

    #[test]
    fn initialization_is_idempotent() {
        let dir = tempdir().unwrap();
        let ledger = ResultLedger::new(dir.path().join("results.csv"));

        ledger.ensure_initialized().unwrap();
        let once = std::fs::read(ledger.path()).unwrap();
        ledger.ensure_initialized().unwrap();
        let twice = std::fs::read(ledger.path()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(
            String::from_utf8(once).unwrap(),
            "filename,plate_text,colour,vehicle_type,confidence\n"
        );
    }

    #[test]
    fn appends_preserve_order_and_prior_rows() {
        let dir = tempdir().unwrap();
        let ledger = ResultLedger::new(dir.path().join("results.csv"));

        ledger.append(&record("a.jpg", "KA01", 0.91)).unwrap();
        ledger.append(&record("b.jpg", "KA02", 0.52)).unwrap();
        ledger.append(&record("b.jpg", "KA03", 0.873)).unwrap();

        let text = String::from_utf8(ledger.read_bytes().unwrap()).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], "filename,plate_text,colour,vehicle_type,confidence");
        assert_eq!(rows[1], "a.jpg,KA01,White,Private,0.91");
        assert_eq!(rows[2], "b.jpg,KA02,White,Private,0.52");
        assert_eq!(rows[3], "b.jpg,KA03,White,Private,0.87");
    }

    #[test]
    fn append_initializes_the_header_lazily() {
        let dir = tempdir().unwrap();
        let ledger = ResultLedger::new(dir.path().join("results.csv"));

        ledger.append(&record("a.jpg", "KA01", 0.5)).unwrap();
        let text = String::from_utf8(ledger.read_bytes().unwrap()).unwrap();
        assert!(text.starts_with("filename,plate_text,colour,vehicle_type,confidence\n"));
    }

    #[test]
    fn missing_ledger_reads_as_not_found() {
        let dir = tempdir().unwrap();
        let ledger = ResultLedger::new(dir.path().join("results.csv"));
        assert!(matches!(
            ledger.read_bytes(),
            Err(Error::LedgerNotFound)
        ));
    }

    #[test]
    fn unwritable_path_surfaces_io_failure() {
        let dir = tempdir().unwrap();
        // The ledger path is a directory; create and append must fail.
        let ledger = ResultLedger::new(dir.path().to_path_buf());
        assert!(matches!(
            ledger.append(&record("a.jpg", "KA01", 0.5)),
            Err(Error::Ledger(_))
        ));
    }
}
