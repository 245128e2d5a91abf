use super::domain::PpmRecord;
use super::schedule::PpmSchedule;
use super::transform::{transform_json, transform_rows, Row, TransformError, TransformOptions};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum PpmImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Transform(TransformError),
}

impl std::fmt::Display for PpmImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PpmImportError::Io(err) => write!(f, "failed to read PPM export: {}", err),
            PpmImportError::Csv(err) => write!(f, "invalid PPM CSV data: {}", err),
            PpmImportError::Json(err) => write!(f, "invalid PPM JSON data: {}", err),
            PpmImportError::Transform(err) => {
                write!(f, "could not build PPM records from export: {}", err)
            }
        }
    }
}

impl std::error::Error for PpmImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PpmImportError::Io(err) => Some(err),
            PpmImportError::Csv(err) => Some(err),
            PpmImportError::Json(err) => Some(err),
            PpmImportError::Transform(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PpmImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PpmImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for PpmImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<TransformError> for PpmImportError {
    fn from(err: TransformError) -> Self {
        Self::Transform(err)
    }
}

/// Reads tracker exports (CSV or JSON) into PPM records.
#[derive(Debug, Clone)]
pub struct PpmImporter {
    schedule: PpmSchedule,
    options: TransformOptions,
}

impl PpmImporter {
    pub fn new(schedule: PpmSchedule, options: TransformOptions) -> Self {
        Self { schedule, options }
    }

    pub fn schedule(&self) -> &PpmSchedule {
        &self.schedule
    }

    pub fn csv_from_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PpmRecord>, PpmImportError> {
        let file = std::fs::File::open(path)?;
        self.csv_from_reader(file)
    }

    pub fn csv_from_reader<R: Read>(&self, reader: R) -> Result<Vec<PpmRecord>, PpmImportError> {
        let rows = read_csv_rows(reader)?;
        let records = transform_rows(&rows, &self.schedule, self.options)?;
        log_import("csv", rows.len(), records.len());
        Ok(records)
    }

    pub fn json_from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Vec<PpmRecord>, PpmImportError> {
        let file = std::fs::File::open(path)?;
        self.json_from_reader(file)
    }

    pub fn json_from_reader<R: Read>(&self, reader: R) -> Result<Vec<PpmRecord>, PpmImportError> {
        let value: Value = serde_json::from_reader(reader)?;
        self.json_from_value(&value)
    }

    pub fn json_from_value(&self, value: &Value) -> Result<Vec<PpmRecord>, PpmImportError> {
        let records = transform_json(value, &self.schedule, self.options)?;
        let rows = value.as_array().map_or(0, Vec::len);
        log_import("json", rows, records.len());
        Ok(records)
    }

    pub fn rows(&self, rows: &[Row]) -> Result<Vec<PpmRecord>, PpmImportError> {
        let records = transform_rows(rows, &self.schedule, self.options)?;
        log_import("rows", rows.len(), records.len());
        Ok(records)
    }
}

impl Default for PpmImporter {
    fn default() -> Self {
        Self::new(PpmSchedule::standard(), TransformOptions::default())
    }
}

/// Every CSV cell becomes a string value keyed by its header.
fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<Row>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}'))
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn log_import(source: &'static str, rows: usize, records: usize) {
    info!(
        source,
        rows,
        records,
        skipped = rows.saturating_sub(records),
        "imported PPM records"
    );
}
