use super::domain::{PpmPeriod, PpmRecord, PpmStatus};
use super::schedule::{PeriodSlot, PpmSchedule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One loosely-typed spreadsheet row: column name to cell value.
pub type Row = serde_json::Map<String, Value>;

/// What to do with a status cell that is present but not one of the known values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownStatusPolicy {
    Coerce(PpmStatus),
    Reject,
}

impl Default for UnknownStatusPolicy {
    fn default() -> Self {
        Self::Coerce(PpmStatus::Pending)
    }
}

/// What to do with a row whose id cell is missing or non-numeric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingIdPolicy {
    /// Use the record's 1-based position in the output.
    #[default]
    Positional,
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub unknown_status: UnknownStatusPolicy,
    pub missing_id: MissingIdPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    InputShape(String),
    /// `row` is the 1-based position in the input.
    InvalidId { row: usize, value: String },
    UnknownStatus {
        row: usize,
        period: String,
        value: String,
    },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::InputShape(detail) => write!(f, "unsupported input shape: {}", detail),
            TransformError::InvalidId { row, value } => {
                write!(f, "row {} has no usable id (found '{}')", row, value)
            }
            TransformError::UnknownStatus { row, period, value } => write!(
                f,
                "row {} period {} has unrecognized status '{}'",
                row, period, value
            ),
        }
    }
}

impl std::error::Error for TransformError {}

pub fn transform_rows(
    rows: &[Row],
    schedule: &PpmSchedule,
    options: TransformOptions,
) -> Result<Vec<PpmRecord>, TransformError> {
    transform_iter(rows.iter(), schedule, options)
}

/// Accepts the JSON shape produced by spreadsheet-to-JSON tooling: an array of objects.
pub fn transform_json(
    value: &Value,
    schedule: &PpmSchedule,
    options: TransformOptions,
) -> Result<Vec<PpmRecord>, TransformError> {
    let items = value.as_array().ok_or_else(|| {
        TransformError::InputShape(format!("expected an array of rows, found {}", kind(value)))
    })?;

    let rows = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object().ok_or_else(|| {
                TransformError::InputShape(format!(
                    "row {} is {}, expected an object",
                    index + 1,
                    kind(item)
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    transform_iter(rows, schedule, options)
}

fn transform_iter<'a, I>(
    rows: I,
    schedule: &PpmSchedule,
    options: TransformOptions,
) -> Result<Vec<PpmRecord>, TransformError>
where
    I: IntoIterator<Item = &'a Row>,
{
    let columns = schedule.columns();
    let mut records = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        let row_number = index + 1;
        let id_cell = first_present(row, &columns.id_keys);
        let location = first_text(row, &columns.location_keys);
        let equipment = first_text(row, &columns.equipment_keys);

        if id_cell.is_none() && location.is_none() && equipment.is_none() {
            continue;
        }

        let id = match id_cell.and_then(parse_id) {
            Some(id) => id,
            None => match options.missing_id {
                MissingIdPolicy::Positional => (records.len() + 1) as u32,
                MissingIdPolicy::Reject => {
                    return Err(TransformError::InvalidId {
                        row: row_number,
                        value: id_cell.and_then(cell_text).unwrap_or_default(),
                    })
                }
            },
        };

        let periods = schedule
            .slots()
            .iter()
            .map(|slot| extract_period(row, slot, row_number, options.unknown_status))
            .collect::<Result<Vec<_>, _>>()?;

        records.push(PpmRecord {
            id,
            location: location.unwrap_or_default(),
            equipment: equipment.unwrap_or_default(),
            periods,
        });
    }

    Ok(records)
}

fn extract_period(
    row: &Row,
    slot: &PeriodSlot,
    row_number: usize,
    policy: UnknownStatusPolicy,
) -> Result<PpmPeriod, TransformError> {
    let status = match text(row, &slot.status_key) {
        None => PpmStatus::Pending,
        Some(raw) => match (PpmStatus::parse(&raw), policy) {
            (Some(status), _) => status,
            (None, UnknownStatusPolicy::Coerce(fallback)) => fallback,
            (None, UnknownStatusPolicy::Reject) => {
                return Err(TransformError::UnknownStatus {
                    row: row_number,
                    period: slot.label.clone(),
                    value: raw,
                })
            }
        },
    };

    Ok(PpmPeriod {
        date: slot.label.clone(),
        status,
        findings: text(row, &slot.findings_key).unwrap_or_default(),
        findings_status: text(row, &slot.findings_status_key).unwrap_or_default(),
    })
}

fn first_present<'a>(row: &'a Row, keys: &[String]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(key))
        .find(|value| cell_text(value).is_some())
}

fn first_text(row: &Row, keys: &[String]) -> Option<String> {
    keys.iter().find_map(|key| text(row, key))
}

fn text(row: &Row, key: &str) -> Option<String> {
    row.get(key).and_then(cell_text)
}

/// Stringifies a cell; null and blank cells count as absent.
fn cell_text(value: &Value) -> Option<String> {
    let raw = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    };
    Some(raw).filter(|s| !s.is_empty())
}

/// Spreadsheet tooling writes whole numbers as floats; `3.0` reads as `3`.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(float) if n.is_f64() && float.fract() == 0.0 && float.abs() < 9.0e15 => {
            format!("{}", float as i64)
        }
        _ => n.to_string(),
    }
}

/// Integer ids come either as numbers (spreadsheets often emit `3.0`) or as
/// text whose leading digits form the id (`"12"`, `"12a"`).
fn parse_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(whole) = n.as_u64() {
                return u32::try_from(whole).ok();
            }
            let float = n.as_f64()?;
            if float.fract() == 0.0 && float >= 0.0 && float <= u32::MAX as f64 {
                Some(float as u32)
            } else {
                None
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse().ok()
        }
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppm::schedule::RecordColumns;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("row literal is an object")
    }

    #[test]
    fn single_completed_period_defaults_the_rest() {
        let rows = vec![row(json!({
            "S.No": 1,
            "Location": "Building A",
            "Equipment": "Panel, Pump",
            "Dec-24 Status": "PPM Completed",
        }))];

        let records = transform_rows(&rows, &PpmSchedule::standard(), TransformOptions::default())
            .expect("transform succeeds");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, 1);
        assert_eq!(record.periods.len(), 4);
        assert_eq!(record.periods[0].status.label(), "PPM Completed");
        for period in &record.periods[1..] {
            assert_eq!(period.status.label(), "PPM Pending");
            assert!(period.findings.is_empty());
            assert!(period.findings_status.is_empty());
        }
    }

    #[test]
    fn rows_without_identity_columns_are_skipped() {
        let rows = vec![
            row(json!({ "Dec-24 Status": "PPM Completed", "Notes": "blank line" })),
            row(json!({ "S.No": null, "Location": "  ", "Equipment": "" })),
            row(json!({ "Location": "Pump Room", "Equipment": "Jockey Pump" })),
        ];

        let records = transform_rows(&rows, &PpmSchedule::standard(), TransformOptions::default())
            .expect("transform succeeds");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, "Pump Room");
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn missing_id_falls_back_to_output_position() {
        let rows = vec![
            row(json!({ "S.No": "7", "Location": "Block B", "Equipment": "Hose Reel" })),
            row(json!({ "Location": "Block C", "Equipment": "Sprinkler" })),
        ];

        let records = transform_rows(&rows, &PpmSchedule::standard(), TransformOptions::default())
            .expect("transform succeeds");

        assert_eq!(records[0].id, 7);
        assert_eq!(records[1].id, 2);
    }

    #[test]
    fn missing_id_can_be_rejected() {
        let rows = vec![row(json!({ "S.No": "n/a", "Location": "Block C", "Equipment": "Sprinkler" }))];
        let options = TransformOptions {
            missing_id: MissingIdPolicy::Reject,
            ..TransformOptions::default()
        };

        let error = transform_rows(&rows, &PpmSchedule::standard(), options)
            .expect_err("id is rejected");
        assert_eq!(
            error,
            TransformError::InvalidId {
                row: 1,
                value: "n/a".to_string()
            }
        );
    }

    #[test]
    fn cells_are_coerced_to_text() {
        let rows = vec![row(json!({
            "S.No": 3.0,
            "Location": 101,
            "Equipment": "Alarm Panel",
            "Mar-25 Status": "in progress",
            "Mar-25 Findings": 2,
            "Mar-25 Findings Status": true,
        }))];

        let records = transform_rows(&rows, &PpmSchedule::standard(), TransformOptions::default())
            .expect("transform succeeds");

        let record = &records[0];
        assert_eq!(record.id, 3);
        assert_eq!(record.location, "101");
        let march = record.period("Mar-25").expect("march period");
        assert_eq!(march.status, PpmStatus::InProgress);
        assert_eq!(march.findings, "2");
        assert_eq!(march.findings_status, "true");
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        let rows = vec![row(json!({
            "S.No": 1,
            "Location": 3.0,
            "Equipment": "Hose Reel",
            "Dec-24 Findings": 2.5,
            "Dec-24 Findings Status": -4.0,
        }))];

        let records = transform_rows(&rows, &PpmSchedule::standard(), TransformOptions::default())
            .expect("transform succeeds");

        assert_eq!(records[0].location, "3");
        assert_eq!(records[0].periods[0].findings, "2.5");
        assert_eq!(records[0].periods[0].findings_status, "-4");
    }

    #[test]
    fn custom_schedule_columns_drive_extraction() {
        let columns = RecordColumns {
            id_keys: vec!["Ref".into()],
            location_keys: vec!["Site".into()],
            equipment_keys: vec!["Asset".into()],
        };
        let schedule = PpmSchedule::new(
            columns,
            vec![PeriodSlot::new("Q1", "Q1 State", "Q1 Issues", "Q1 Action")],
        )
        .expect("valid schedule");
        let rows = vec![
            row(json!({
                "Ref": "42",
                "Site": "Car Park",
                "Asset": "Deluge Valve",
                "Q1 State": "PPM In Progress",
                "Q1 Issues": "Pressure switch stuck",
                "Q1 Action": "Quote sent for spares",
                "Dec-24 Status": "PPM Completed",
            })),
            row(json!({
                "S.No": 9,
                "Location": "Lobby",
                "Equipment": "Extinguisher",
                "Q1 Status": "PPM Completed",
            })),
        ];

        let records =
            transform_rows(&rows, &schedule, TransformOptions::default()).expect("transform");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, 42);
        assert_eq!(record.location, "Car Park");
        assert_eq!(record.equipment, "Deluge Valve");
        assert_eq!(record.periods.len(), 1);
        let q1 = &record.periods[0];
        assert_eq!(q1.date, "Q1");
        assert_eq!(q1.status, PpmStatus::InProgress);
        assert_eq!(q1.findings, "Pressure switch stuck");
        assert_eq!(q1.findings_status, "Quote sent for spares");
    }

    #[test]
    fn unknown_status_follows_policy() {
        let rows = vec![row(json!({
            "S.No": 1,
            "Location": "Roof",
            "Equipment": "Fire Pump",
            "Dec-24 Status": "Awaiting access",
        }))];
        let schedule = PpmSchedule::standard();

        let coerced = transform_rows(
            &rows,
            &schedule,
            TransformOptions {
                unknown_status: UnknownStatusPolicy::Coerce(PpmStatus::InProgress),
                ..TransformOptions::default()
            },
        )
        .expect("coerced");
        assert_eq!(coerced[0].periods[0].status, PpmStatus::InProgress);
        assert_eq!(coerced[0].periods[1].status, PpmStatus::Pending);

        let error = transform_rows(
            &rows,
            &schedule,
            TransformOptions {
                unknown_status: UnknownStatusPolicy::Reject,
                ..TransformOptions::default()
            },
        )
        .expect_err("rejected");
        assert!(matches!(
            error,
            TransformError::UnknownStatus { row: 1, ref period, .. } if period == "Dec-24"
        ));
    }

    #[test]
    fn json_input_must_be_an_array_of_objects() {
        let schedule = PpmSchedule::standard();
        let options = TransformOptions::default();

        let error = transform_json(&json!({ "rows": [] }), &schedule, options)
            .expect_err("object rejected");
        assert!(matches!(error, TransformError::InputShape(_)));

        let error = transform_json(&json!([{ "S.No": 1 }, 5]), &schedule, options)
            .expect_err("scalar row rejected");
        assert_eq!(
            error,
            TransformError::InputShape("row 2 is a number, expected an object".to_string())
        );

        let records = transform_json(&json!([]), &schedule, options).expect("empty array is fine");
        assert!(records.is_empty());
    }

    #[test]
    fn parse_id_reads_leading_digits() {
        assert_eq!(parse_id(&json!("12")), Some(12));
        assert_eq!(parse_id(&json!(" 12a ")), Some(12));
        assert_eq!(parse_id(&json!("1.0")), Some(1));
        assert_eq!(parse_id(&json!(4.5)), None);
        assert_eq!(parse_id(&json!(-3)), None);
        assert_eq!(parse_id(&json!("abc")), None);
    }
}
