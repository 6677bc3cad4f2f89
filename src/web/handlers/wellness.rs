//! Dashboard and workshop handlers.
//!
//! Both endpoints serve fixed demo content.

use axum::Json;

use crate::web::dto::{DashboardResponse, StressPoint, WorkshopProgress, WorkshopResponse};

const RECENT_ACTIVITY: [&str; 4] = [
    "Joined Workshop: Stress Management",
    "Completed Meditation Session",
    "Added Goal: Practice Mindfulness",
    "Completed 5-Day Workout Challenge",
];

const STRESS_LEVELS: [(&str, u8); 7] = [
    ("January", 3),
    ("February", 2),
    ("March", 4),
    ("April", 5),
    ("May", 3),
    ("June", 4),
    ("July", 3),
];

const WORKSHOP_COMPLETION: [bool; 4] = [true, false, true, true];

const UPCOMING_WORKSHOPS: [(&str, &str, &str); 2] = [
    ("Stress Management 101", "2024-11-01", "5:00 PM"),
    ("Mindfulness and Meditation", "2024-11-05", "4:00 PM"),
];

/// GET /api/dashboard - User progress summary.
pub async fn get_dashboard() -> Json<DashboardResponse> {
    Json(DashboardResponse {
        progress: 80,
        recent_activity: RECENT_ACTIVITY.iter().map(|s| s.to_string()).collect(),
        stress_data: STRESS_LEVELS
            .iter()
            .map(|(month, level)| StressPoint {
                month: month.to_string(),
                level: *level,
            })
            .collect(),
        workshops: WORKSHOP_COMPLETION
            .iter()
            .enumerate()
            .map(|(i, completed)| WorkshopProgress {
                name: format!("Workshop {}", i + 1),
                completed: *completed,
            })
            .collect(),
        username: "JohnDoe".to_string(),
        ranking: 1,
    })
}

/// GET /api/workshops - Upcoming workshops.
pub async fn list_workshops() -> Json<Vec<WorkshopResponse>> {
    Json(
        UPCOMING_WORKSHOPS
            .iter()
            .map(|(title, date, time)| WorkshopResponse {
                title: title.to_string(),
                date: date.to_string(),
                time: time.to_string(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dashboard_content() {
        let Json(dashboard) = get_dashboard().await;
        assert_eq!(dashboard.progress, 80);
        assert_eq!(dashboard.recent_activity.len(), 4);
        assert_eq!(dashboard.stress_data.len(), 7);
        assert_eq!(dashboard.stress_data[3].month, "April");
        assert_eq!(dashboard.stress_data[3].level, 5);
        assert_eq!(dashboard.workshops[1].name, "Workshop 2");
        assert!(!dashboard.workshops[1].completed);
        assert_eq!(dashboard.username, "JohnDoe");
    }

    #[tokio::test]
    async fn test_workshops_content() {
        let Json(workshops) = list_workshops().await;
        assert_eq!(workshops.len(), 2);
        assert_eq!(workshops[0].title, "Stress Management 101");
        assert_eq!(workshops[1].date, "2024-11-05");
    }
}
