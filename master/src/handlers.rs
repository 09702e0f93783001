use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use common::{CollectRequest, CollectResponse, ScheduleRequest, ScheduleResponse};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks/schedule", post(schedule))
        .route("/api/v1/tasks/collect", post(collect))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Worker pide trabajo (o identidad, si viene sin worker_id)
async fn schedule(
    State(state): State<AppState>,
    Json(req): Json<ScheduleRequest>,
) -> Json<ScheduleResponse> {
    let resp = state.scheduler.schedule(req).await;

    if resp.is_finished {
        info!("worker {}: job terminado, puede salir", resp.worker_id);
    }

    Json(resp)
}

// Worker reporta una tarea terminada; la respuesta le dice si puede hacer commit
async fn collect(
    State(state): State<AppState>,
    Json(req): Json<CollectRequest>,
) -> Json<CollectResponse> {
    Json(state.scheduler.collect(req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use common::{JobPhase, SchedulerConfig, TaskKind};
    use serde::de::DeserializeOwned;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let scheduler = Scheduler::new(
            vec!["pg-0.txt".to_string()],
            2,
            SchedulerConfig {
                task_timeout: Duration::from_secs(10),
                schedule_wait: Duration::from_millis(10),
            },
        );
        build_router(AppState::new(scheduler))
    }

    async fn post_json<T: DeserializeOwned>(app: &Router, uri: &str, body: serde_json::Value) -> T {
        let resp = app
            .clone()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_responde_ok() {
        let resp = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn schedule_y_collect_por_http() {
        let app = app();

        let first: ScheduleResponse = post_json(
            &app,
            "/api/v1/tasks/schedule",
            serde_json::json!({ "worker_id": null }),
        )
        .await;
        let task = first.task.unwrap();
        assert_eq!(task.kind, TaskKind::Map);
        assert_eq!(task.reduce_count, 2);
        assert_eq!(first.phase, JobPhase::Mapping);

        let accepted: CollectResponse = post_json(
            &app,
            "/api/v1/tasks/collect",
            serde_json::json!({
                "kind": "MAP",
                "worker_id": first.worker_id,
                "task_index": 0,
                "committed_files": ["mr-0-0", "mr-0-1"],
            }),
        )
        .await;
        assert!(accepted.accepted);

        let again: CollectResponse = post_json(
            &app,
            "/api/v1/tasks/collect",
            serde_json::json!({
                "kind": "MAP",
                "worker_id": first.worker_id,
                "task_index": 0,
                "committed_files": ["mr-0-0", "mr-0-1"],
            }),
        )
        .await;
        assert!(!again.accepted);

        let next: ScheduleResponse = post_json(
            &app,
            "/api/v1/tasks/schedule",
            serde_json::json!({ "worker_id": first.worker_id }),
        )
        .await;
        assert_eq!(next.worker_id, first.worker_id);
        assert_eq!(next.task.unwrap().kind, TaskKind::Reduce);
    }

    #[tokio::test]
    async fn body_invalido_se_rechaza_sin_tocar_el_estado() {
        let app = app();
        let resp = app
            .clone()
            .oneshot(
                Request::post("/api/v1/tasks/collect")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"kind\":\"SHUFFLE\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }
}
