use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::EvError;
use crate::models::{EvDataset, EvRecord, VehicleType};

pub const COL_MODEL_YEAR: &str = "Model Year";
pub const COL_COUNTY: &str = "County";
pub const COL_CITY: &str = "City";
pub const COL_MAKE: &str = "Make";
pub const COL_MODEL: &str = "Model";
pub const COL_VEHICLE_TYPE: &str = "Electric Vehicle Type";
pub const COL_ELECTRIC_RANGE: &str = "Electric Range";

/// Columns the analysis reads; every other column is only checked for completeness.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_MODEL_YEAR,
    COL_COUNTY,
    COL_CITY,
    COL_MAKE,
    COL_MODEL,
    COL_VEHICLE_TYPE,
    COL_ELECTRIC_RANGE,
];

/// Positions of the required columns within the header row.
#[derive(Debug)]
struct ColumnIndex {
    model_year: usize,
    county: usize,
    city: usize,
    make: usize,
    model: usize,
    vehicle_type: usize,
    electric_range: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, EvError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| EvError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            model_year: find(COL_MODEL_YEAR)?,
            county: find(COL_COUNTY)?,
            city: find(COL_CITY)?,
            make: find(COL_MAKE)?,
            model: find(COL_MODEL)?,
            vehicle_type: find(COL_VEHICLE_TYPE)?,
            electric_range: find(COL_ELECTRIC_RANGE)?,
        })
    }
}

/// A row is complete when it has a non-empty value for every header column.
fn is_complete(row: &csv::StringRecord, num_columns: usize) -> bool {
    row.len() >= num_columns && row.iter().take(num_columns).all(|f| !f.is_empty())
}

fn parse_row(row: &csv::StringRecord, cols: &ColumnIndex, row_number: usize) -> Result<EvRecord, EvError> {
    let field = |idx: usize| row.get(idx).unwrap_or_default();

    let year_raw = field(cols.model_year);
    let model_year: i32 = year_raw.parse().map_err(|_| {
        EvError::ParseError(format!(
            "row {row_number}: '{COL_MODEL_YEAR}' value '{year_raw}' is not an integer"
        ))
    })?;

    let range_raw = field(cols.electric_range);
    let electric_range: f64 = range_raw
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| {
            EvError::ParseError(format!(
                "row {row_number}: '{COL_ELECTRIC_RANGE}' value '{range_raw}' is not a number"
            ))
        })?;

    let vehicle_type: VehicleType = field(cols.vehicle_type)
        .parse()
        .map_err(|e| EvError::ParseError(format!("row {row_number}: {e}")))?;

    Ok(EvRecord {
        model_year,
        county: field(cols.county).to_string(),
        city: field(cols.city).to_string(),
        make: field(cols.make).to_string(),
        model: field(cols.model).to_string(),
        vehicle_type,
        electric_range,
    })
}

fn parse_csv_records<R: Read>(rdr: &mut csv::Reader<R>, name: &str) -> Result<EvDataset, EvError> {
    let headers = rdr.headers()?.clone();
    let cols = ColumnIndex::from_headers(&headers)?;
    let num_columns = headers.len();

    let mut dataset = EvDataset::new(name);

    for result in rdr.records() {
        let row = result?;
        dataset.rows_read += 1;
        let row_number = dataset.rows_read;

        if row.len() > num_columns {
            return Err(EvError::ParseError(format!(
                "row {row_number}: expected {num_columns} fields, found {}",
                row.len()
            )));
        }

        if !is_complete(&row, num_columns) {
            debug!(row = row_number, "dropping incomplete row");
            dataset.rows_dropped += 1;
            continue;
        }

        dataset.records.push(parse_row(&row, &cols, row_number)?);
    }

    info!(
        dataset = %dataset.name,
        rows_read = dataset.rows_read,
        kept = dataset.records.len(),
        dropped = dataset.rows_dropped,
        "loaded registration data"
    );

    Ok(dataset)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true).trim(csv::Trim::All);
    builder
}

/// Read EV registration data from a CSV file, dropping incomplete rows.
pub fn read_csv(path: impl AsRef<Path>) -> Result<EvDataset, EvError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(EvError::FileNotFound(path.to_path_buf()));
    }

    let mut rdr = reader_builder().from_path(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    parse_csv_records(&mut rdr, &name)
}

/// Read EV registration data from CSV bytes.
pub fn read_csv_from_bytes(data: &[u8], name: &str) -> Result<EvDataset, EvError> {
    let mut rdr = reader_builder().from_reader(data);
    parse_csv_records(&mut rdr, name)
}
