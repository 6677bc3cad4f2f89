//! Response DTOs for the HTTP API.

use serde::Serialize;

use crate::stress::StressReport;

/// Stress detection result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResponse {
    /// Human-readable stress label.
    pub stress_label: String,
    /// Numeric stress score.
    pub stress_value: f64,
    /// Detected emotion.
    pub emotion: String,
}

impl From<StressReport> for StressResponse {
    fn from(report: StressReport) -> Self {
        Self {
            stress_label: report.stress_label,
            stress_value: report.stress_value,
            emotion: report.emotion,
        }
    }
}

/// Assistant reply. Also used for the failure body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantResponse {
    /// Reply text.
    pub response: String,
}

/// Monthly stress level point.
#[derive(Debug, Clone, Serialize)]
pub struct StressPoint {
    /// Month name.
    pub month: String,
    /// Stress level.
    pub level: u8,
}

/// Workshop completion entry.
#[derive(Debug, Clone, Serialize)]
pub struct WorkshopProgress {
    /// Workshop name.
    pub name: String,
    /// Whether it was completed.
    pub completed: bool,
}

/// Dashboard summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Overall progress percentage.
    pub progress: u8,
    /// Recent activity, newest first.
    pub recent_activity: Vec<String>,
    /// Stress level history.
    pub stress_data: Vec<StressPoint>,
    /// Workshop completion.
    pub workshops: Vec<WorkshopProgress>,
    /// Display name.
    pub username: String,
    /// Community ranking.
    pub ranking: u32,
}

/// Upcoming workshop.
#[derive(Debug, Clone, Serialize)]
pub struct WorkshopResponse {
    /// Title.
    pub title: String,
    /// Date (YYYY-MM-DD).
    pub date: String,
    /// Local start time.
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stress_response_camel_case() {
        let response = StressResponse::from(StressReport {
            stress_label: "Low".to_string(),
            stress_value: 0.25,
            emotion: "neutral".to_string(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"stressLabel": "Low", "stressValue": 0.25, "emotion": "neutral"})
        );
    }

    #[test]
    fn test_dashboard_field_names() {
        let dashboard = DashboardResponse {
            progress: 10,
            recent_activity: vec![],
            stress_data: vec![],
            workshops: vec![],
            username: "u".to_string(),
            ranking: 2,
        };
        let json = serde_json::to_value(&dashboard).unwrap();
        assert!(json.get("recentActivity").is_some());
        assert!(json.get("stressData").is_some());
    }
}
