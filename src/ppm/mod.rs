//! Preventive planned maintenance (PPM) tracking for firefighting and alarm
//! equipment: record model, spreadsheet ingestion and derived analytics.

pub mod analytics;
pub mod domain;
mod import;
pub mod report;
pub mod schedule;
pub mod transform;

pub use analytics::{
    completion_rate, group_findings_by_status, unique_equipment, FindingEntry, FindingsBucket,
    FindingsGrouping, FindingsGroups,
};
pub use domain::{PpmPeriod, PpmRecord, PpmStatus};
pub use import::{PpmImportError, PpmImporter};
pub use report::PpmReport;
pub use schedule::{PeriodSlot, PpmSchedule, RecordColumns, ScheduleError};
pub use transform::{
    transform_json, transform_rows, MissingIdPolicy, Row, TransformError, TransformOptions,
    UnknownStatusPolicy,
};
