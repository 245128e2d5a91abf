use super::{deserialize_optional_date, AppState};
use crate::config::{parse_grouping, parse_missing_id, parse_unknown_status, ConfigError};
use crate::error::AppError;
use crate::ppm::{PpmImporter, PpmRecord, PpmReport, PpmSchedule, TransformOptions};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::atomic::Ordering;

#[derive(Debug, Default, Deserialize)]
pub struct PpmReportRequest {
    /// Spreadsheet rows as a JSON array of objects.
    #[serde(default)]
    pub rows: Option<Value>,
    /// Raw CSV export with a header row.
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub as_of: Option<NaiveDate>,
    /// Overrides the standard quarterly period labels.
    #[serde(default)]
    pub periods: Option<Vec<String>>,
    #[serde(default)]
    pub grouping: Option<String>,
    #[serde(default)]
    pub unknown_status: Option<String>,
    #[serde(default)]
    pub missing_id: Option<String>,
    #[serde(default)]
    pub include_records: bool,
}

#[derive(Debug, Serialize)]
pub struct PpmReportResponse {
    pub data_source: PpmDataSource,
    #[serde(flatten)]
    pub report: PpmReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<PpmRecord>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PpmDataSource {
    Csv,
    Rows,
}

/// Routes without state; callers attach `Extension<AppState>`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/ppm/report", post(ppm_report_endpoint))
}

async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn ppm_report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<PpmReportRequest>,
) -> Result<Json<PpmReportResponse>, AppError> {
    let PpmReportRequest {
        rows,
        csv,
        as_of,
        periods,
        grouping,
        unknown_status,
        missing_id,
        include_records,
    } = payload;

    let defaults = state.ppm.as_ref();
    let options = TransformOptions {
        unknown_status: unknown_status
            .as_deref()
            .map(parse_unknown_status)
            .transpose()
            .map_err(policy_error)?
            .unwrap_or(defaults.unknown_status),
        missing_id: missing_id
            .as_deref()
            .map(parse_missing_id)
            .transpose()
            .map_err(policy_error)?
            .unwrap_or(defaults.missing_id),
    };
    let grouping = match grouping.as_deref() {
        Some(value) => parse_grouping(value).map_err(policy_error)?,
        None => defaults.grouping.clone(),
    };
    let schedule = match periods {
        Some(labels) => PpmSchedule::from_labels(labels)?,
        None => PpmSchedule::standard(),
    };

    let importer = PpmImporter::new(schedule, options);
    let (records, data_source) = match (rows, csv) {
        (Some(rows), None) => (importer.json_from_value(&rows)?, PpmDataSource::Rows),
        (None, Some(csv)) => (
            importer.csv_from_reader(Cursor::new(csv.into_bytes()))?,
            PpmDataSource::Csv,
        ),
        _ => {
            return Err(AppError::BadRequest(
                "provide exactly one of `rows` or `csv`".to_string(),
            ))
        }
    };

    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let report = PpmReport::build(&records, importer.schedule(), &grouping, as_of);

    Ok(Json(PpmReportResponse {
        data_source,
        report,
        records: include_records.then_some(records),
    }))
}

fn policy_error(err: ConfigError) -> AppError {
    AppError::BadRequest(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PpmConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            ppm: Arc::new(PpmConfig::default()),
        }
    }

    fn sample_rows() -> Value {
        json!([
            {
                "S.No": 1,
                "Location": "Building A",
                "Equipment": "Panel, Pump",
                "Dec-24 Status": "PPM Completed",
                "Dec-24 Findings": "Battery defective",
                "Dec-24 Findings Status": "Quote sent for spares"
            },
            {
                "S.No": 2,
                "Location": "Building B",
                "Equipment": "Pump, Battery",
                "Dec-24 Status": "PPM Pending"
            }
        ])
    }

    #[tokio::test]
    async fn report_endpoint_summarizes_rows() {
        let request = PpmReportRequest {
            rows: Some(sample_rows()),
            as_of: NaiveDate::from_ymd_opt(2025, 1, 15),
            grouping: Some("seeded".to_string()),
            include_records: true,
            ..PpmReportRequest::default()
        };

        let Json(body) = ppm_report_endpoint(Extension(state()), Json(request))
            .await
            .expect("report builds");

        assert_eq!(body.data_source, PpmDataSource::Rows);
        assert_eq!(body.report.record_count, 2);
        assert_eq!(body.report.equipment, ["Battery", "Panel", "Pump"]);
        assert_eq!(body.report.period_progress[0].completion_rate, 50);
        assert_eq!(
            body.report.findings.get("Quote sent for spares").map(<[_]>::len),
            Some(1)
        );
        assert_eq!(body.report.findings.get("Other").map(<[_]>::len), Some(0));
        assert_eq!(body.records.expect("records included").len(), 2);
    }

    #[tokio::test]
    async fn report_endpoint_accepts_csv_and_custom_periods() {
        let request = PpmReportRequest {
            csv: Some(
                "S.No,Location,Equipment,Jan-25 Status\n1,Lobby,Extinguisher,Completed\n"
                    .to_string(),
            ),
            periods: Some(vec!["Jan-25".to_string(), "Jul-25".to_string()]),
            ..PpmReportRequest::default()
        };

        let Json(body) = ppm_report_endpoint(Extension(state()), Json(request))
            .await
            .expect("report builds");

        assert_eq!(body.data_source, PpmDataSource::Csv);
        assert_eq!(body.report.period_progress.len(), 2);
        assert_eq!(body.report.period_progress[0].completion_rate, 100);
        assert_eq!(body.report.latest_period.as_deref(), Some("Jul-25"));
        assert_eq!(body.report.latest_completion_rate, 0);
        assert!(body.records.is_none());
    }

    #[tokio::test]
    async fn report_endpoint_requires_exactly_one_source() {
        let error = ppm_report_endpoint(Extension(state()), Json(PpmReportRequest::default()))
            .await
            .expect_err("no data supplied");
        assert!(matches!(error, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn report_endpoint_rejects_unknown_policy_values() {
        let request = PpmReportRequest {
            rows: Some(sample_rows()),
            unknown_status: Some("maybe".to_string()),
            ..PpmReportRequest::default()
        };
        let error = ppm_report_endpoint(Extension(state()), Json(request))
            .await
            .expect_err("policy rejected");
        assert!(matches!(error, AppError::BadRequest(_)));
    }
}
