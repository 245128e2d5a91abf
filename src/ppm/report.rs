use super::analytics::{
    completion_rate, group_findings_by_status, percentage, unique_equipment, FindingsGrouping,
    FindingsGroups,
};
use super::domain::{PpmRecord, PpmStatus};
use super::schedule::PpmSchedule;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PeriodProgressEntry {
    pub date: String,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub total: usize,
    pub completion_rate: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: PpmStatus,
    pub status_label: &'static str,
    pub count: usize,
}

/// Dashboard summary for the firefighting & alarm tracker.
#[derive(Debug, Clone, Serialize)]
pub struct PpmReport {
    pub as_of: NaiveDate,
    pub record_count: usize,
    pub equipment: Vec<String>,
    pub period_progress: Vec<PeriodProgressEntry>,
    pub status_totals: Vec<StatusCountEntry>,
    pub overall_completion_rate: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_period: Option<String>,
    pub latest_completion_rate: u8,
    pub open_findings: usize,
    pub findings: FindingsGroups,
}

impl PpmReport {
    pub fn build(
        records: &[PpmRecord],
        schedule: &PpmSchedule,
        grouping: &FindingsGrouping,
        as_of: NaiveDate,
    ) -> Self {
        let period_progress: Vec<PeriodProgressEntry> = schedule
            .labels()
            .map(|label| period_progress(records, label))
            .collect();

        let status_totals = PpmStatus::ordered()
            .into_iter()
            .map(|status| StatusCountEntry {
                status,
                status_label: status.label(),
                count: records
                    .iter()
                    .flat_map(|record| &record.periods)
                    .filter(|period| period.status == status)
                    .count(),
            })
            .collect();

        let (completed, total) = period_progress
            .iter()
            .fold((0, 0), |(completed, total), entry| {
                (completed + entry.completed, total + entry.total)
            });

        let latest_period = schedule.latest_label().map(str::to_string);
        let latest_completion_rate = latest_period
            .as_deref()
            .map_or(0, |label| completion_rate(records, label));

        let findings = group_findings_by_status(records, grouping);

        Self {
            as_of,
            record_count: records.len(),
            equipment: unique_equipment(records),
            period_progress,
            status_totals,
            overall_completion_rate: percentage(completed, total),
            latest_period,
            latest_completion_rate,
            open_findings: findings.total_entries(),
            findings,
        }
    }
}

fn period_progress(records: &[PpmRecord], label: &str) -> PeriodProgressEntry {
    let mut entry = PeriodProgressEntry {
        date: label.to_string(),
        completed: 0,
        in_progress: 0,
        pending: 0,
        total: 0,
        completion_rate: completion_rate(records, label),
    };

    for period in records.iter().filter_map(|record| record.period(label)) {
        entry.total += 1;
        match period.status {
            PpmStatus::Completed => entry.completed += 1,
            PpmStatus::InProgress => entry.in_progress += 1,
            PpmStatus::Pending => entry.pending += 1,
        }
    }

    entry
}
