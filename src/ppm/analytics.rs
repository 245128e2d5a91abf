use super::domain::{PpmRecord, PpmStatus};
use serde::Serialize;
use std::collections::BTreeSet;

pub const QUOTE_SENT_FOR_SPARES: &str = "Quote sent for spares";
pub const QUOTE_AWAITING_APPROVAL: &str = "Quote sent for spares. Waiting for approval";
pub const OTHER_BUCKET: &str = "Other";

/// Distinct equipment names across all records, ascending.
pub fn unique_equipment(records: &[PpmRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(PpmRecord::equipment_names)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Percentage of records whose `label` period is completed, rounded half-up.
/// Records without a `label` period are ignored; no match at all yields 0.
pub fn completion_rate(records: &[PpmRecord], label: &str) -> u8 {
    let (completed, total) = records
        .iter()
        .filter_map(|record| record.period(label))
        .fold((0usize, 0usize), |(completed, total), period| {
            let done = usize::from(period.status == PpmStatus::Completed);
            (completed + done, total + 1)
        });

    percentage(completed, total)
}

pub(crate) fn percentage(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((200 * part + total) / (2 * total)) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingEntry {
    pub location: String,
    pub equipment: String,
    pub date: String,
    pub findings: String,
    pub findings_status: String,
}

impl FindingEntry {
    /// Individual defects when the findings cell lists one per line.
    pub fn items(&self) -> Vec<&str> {
        self.findings
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingsBucket {
    pub status: String,
    pub entries: Vec<FindingEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FindingsGroups {
    buckets: Vec<FindingsBucket>,
}

impl FindingsGroups {
    pub fn get(&self, status: &str) -> Option<&[FindingEntry]> {
        self.buckets
            .iter()
            .find(|bucket| bucket.status == status)
            .map(|bucket| bucket.entries.as_slice())
    }

    pub fn buckets(&self) -> &[FindingsBucket] {
        &self.buckets
    }

    pub fn total_entries(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.entries.len()).sum()
    }

    fn bucket_mut(&mut self, status: &str) -> &mut FindingsBucket {
        let position = match self.buckets.iter().position(|bucket| bucket.status == status) {
            Some(position) => position,
            None => {
                self.buckets.push(FindingsBucket {
                    status: status.to_string(),
                    entries: Vec::new(),
                });
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[position]
    }
}

/// How findings are bucketed by their remediation status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FindingsGrouping {
    /// One bucket per literal status value, in first-seen order.
    #[default]
    Dynamic,
    /// Fixed buckets that always appear; anything else lands in `catch_all`.
    Seeded {
        buckets: Vec<String>,
        catch_all: String,
    },
}

impl FindingsGrouping {
    /// The two procurement statuses the tracker sheets use, plus "Other".
    pub fn standard_seeded() -> Self {
        Self::Seeded {
            buckets: vec![
                QUOTE_SENT_FOR_SPARES.to_string(),
                QUOTE_AWAITING_APPROVAL.to_string(),
            ],
            catch_all: OTHER_BUCKET.to_string(),
        }
    }
}

pub fn group_findings_by_status(
    records: &[PpmRecord],
    grouping: &FindingsGrouping,
) -> FindingsGroups {
    let mut groups = FindingsGroups::default();
    if let FindingsGrouping::Seeded { buckets, catch_all } = grouping {
        for status in buckets.iter().chain(std::iter::once(catch_all)) {
            groups.bucket_mut(status);
        }
    }

    for record in records {
        for period in record.periods.iter().filter(|period| period.has_findings()) {
            let key = match grouping {
                FindingsGrouping::Dynamic => period.findings_status.as_str(),
                FindingsGrouping::Seeded { buckets, catch_all } => {
                    if buckets.iter().any(|bucket| *bucket == period.findings_status) {
                        period.findings_status.as_str()
                    } else {
                        catch_all.as_str()
                    }
                }
            };

            groups.bucket_mut(key).entries.push(FindingEntry {
                location: record.location.clone(),
                equipment: record.equipment.clone(),
                date: period.date.clone(),
                findings: period.findings.clone(),
                findings_status: period.findings_status.clone(),
            });
        }
    }

    groups
}
