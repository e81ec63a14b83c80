mod csv_io;

use std::path::Path;

use crate::error::EvError;
use crate::models::EvDataset;

pub use csv_io::{read_csv, read_csv_from_bytes, REQUIRED_COLUMNS};

/// Trait for reading a registration dataset from a file.
pub trait DatasetReader {
    fn read(&self, path: &Path) -> Result<EvDataset, EvError>;
}

/// CSV format reader.
pub struct CsvFormat;

impl DatasetReader for CsvFormat {
    fn read(&self, path: &Path) -> Result<EvDataset, EvError> {
        read_csv(path)
    }
}

/// Pick a reader from the file extension.
pub fn reader_for(path: &Path) -> Result<Box<dyn DatasetReader>, EvError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" | "txt" => Ok(Box::new(CsvFormat)),
        _ => Err(EvError::ParseError(format!(
            "Unsupported file format: .{ext}. Use .csv"
        ))),
    }
}
