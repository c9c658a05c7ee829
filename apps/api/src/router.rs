use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use scheduling_cell::{scheduling_routes, SchedulingService};

pub fn create_router(scheduling: Arc<SchedulingService>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/scheduling", scheduling_routes(scheduling))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use scheduling_cell::adapters::InMemoryCalendar;
    use shared_config::SchedulingConfig;
    use tower::ServiceExt;

    fn app() -> Router {
        let calendar = Arc::new(InMemoryCalendar::new());
        let service = SchedulingService::new(calendar.clone(), calendar, SchedulingConfig::default());
        create_router(Arc::new(service))
    }

    #[tokio::test]
    async fn test_root_responds() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_scheduling_routes_are_nested() {
        let body = serde_json::json!({
            "therapist_id": "550e8400-e29b-41d4-a716-446655440000",
            "date": "2025-06-16",
            "duration": 60,
            "preferences": { "maxTimeShift": 0 }
        });

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/scheduling/conflicts/resolve")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
