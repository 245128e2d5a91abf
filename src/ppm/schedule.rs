use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Column names carrying one inspection cycle's triplet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodSlot {
    pub label: String,
    pub status_key: String,
    pub findings_key: String,
    pub findings_status_key: String,
}

impl PeriodSlot {
    pub fn new(
        label: impl Into<String>,
        status_key: impl Into<String>,
        findings_key: impl Into<String>,
        findings_status_key: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            status_key: status_key.into(),
            findings_key: findings_key.into(),
            findings_status_key: findings_status_key.into(),
        }
    }

    /// Slot whose columns follow the tracker export convention:
    /// `<label> Status`, `<label> Findings`, `<label> Findings Status`.
    pub fn conventional(label: &str) -> Self {
        Self::new(
            label,
            format!("{label} Status"),
            format!("{label} Findings"),
            format!("{label} Findings Status"),
        )
    }
}

/// Column names identifying the tracked location/equipment pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordColumns {
    pub id_keys: Vec<String>,
    pub location_keys: Vec<String>,
    pub equipment_keys: Vec<String>,
}

impl Default for RecordColumns {
    fn default() -> Self {
        Self {
            id_keys: vec!["S.No".to_string(), "S/N".to_string(), "ID".to_string()],
            location_keys: vec!["Location".to_string()],
            equipment_keys: vec!["Equipment".to_string(), "Equipment Name".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PpmSchedule {
    columns: RecordColumns,
    slots: Vec<PeriodSlot>,
}

impl PpmSchedule {
    pub fn new(columns: RecordColumns, slots: Vec<PeriodSlot>) -> Result<Self, ScheduleError> {
        if slots.is_empty() {
            return Err(ScheduleError::Empty);
        }

        let mut seen = HashSet::with_capacity(slots.len());
        for (index, slot) in slots.iter().enumerate() {
            if slot.label.trim().is_empty() {
                return Err(ScheduleError::BlankLabel(index));
            }
            if !seen.insert(slot.label.as_str()) {
                return Err(ScheduleError::DuplicateLabel(slot.label.clone()));
            }
        }

        Ok(Self { columns, slots })
    }

    /// Quarterly firefighting & alarm schedule used by the tracker exports.
    pub fn standard() -> Self {
        Self {
            columns: RecordColumns::default(),
            slots: STANDARD_PERIOD_LABELS
                .iter()
                .map(|label| PeriodSlot::conventional(label))
                .collect(),
        }
    }

    pub fn from_labels<I, S>(labels: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let slots = labels
            .into_iter()
            .map(|label| PeriodSlot::conventional(label.as_ref().trim()))
            .collect();
        Self::new(RecordColumns::default(), slots)
    }

    pub fn columns(&self) -> &RecordColumns {
        &self.columns
    }

    pub fn slots(&self) -> &[PeriodSlot] {
        &self.slots
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.label.as_str())
    }

    pub fn latest_label(&self) -> Option<&str> {
        self.slots.last().map(|slot| slot.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

const STANDARD_PERIOD_LABELS: [&str; 4] = ["Dec-24", "Mar-25", "Jun-25", "Sep-25"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    Empty,
    /// Position of the slot whose label is blank.
    BlankLabel(usize),
    DuplicateLabel(String),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::Empty => write!(f, "schedule must define at least one period"),
            ScheduleError::BlankLabel(index) => {
                write!(f, "period {} has a blank label", index + 1)
            }
            ScheduleError::DuplicateLabel(label) => {
                write!(f, "period label {} appears more than once", label)
            }
        }
    }
}

impl std::error::Error for ScheduleError {}
