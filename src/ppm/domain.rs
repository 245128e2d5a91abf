use serde::{Deserialize, Serialize};

/// Outcome of one inspection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PpmStatus {
    Completed,
    Pending,
    InProgress,
}

impl PpmStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Completed, Self::InProgress, Self::Pending]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "PPM Completed",
            Self::Pending => "PPM Pending",
            Self::InProgress => "PPM In Progress",
        }
    }

    /// Recognizes both the tracker labels ("PPM Completed") and the bare
    /// status words ("completed", "in-progress"). Case and spacing are ignored.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        let bare = normalized
            .strip_prefix("ppm ")
            .unwrap_or(normalized.as_str());

        match bare {
            "completed" | "complete" | "done" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "in progress" | "inprogress" | "ongoing" => Some(Self::InProgress),
            _ => None,
        }
    }
}

/// One inspection cycle of a tracked location/equipment pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpmPeriod {
    /// Opaque cycle label such as `Dec-24`.
    pub date: String,
    pub status: PpmStatus,
    pub findings: String,
    pub findings_status: String,
}

impl PpmPeriod {
    pub fn has_findings(&self) -> bool {
        !self.findings.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpmRecord {
    pub id: u32,
    pub location: String,
    /// May pack several names separated by commas.
    pub equipment: String,
    pub periods: Vec<PpmPeriod>,
}

impl PpmRecord {
    pub fn period(&self, label: &str) -> Option<&PpmPeriod> {
        self.periods.iter().find(|period| period.date == label)
    }

    pub fn equipment_names(&self) -> impl Iterator<Item = &str> {
        self.equipment
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
