//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::resolve::{EnrichedSchedule, ResolveError, ScheduleQuery};
use crate::store::{ScheduleStore, StoreError};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schedules/:identifier_type/:identifier", get(get_schedules))
        .route("/refresh", get(refresh))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Schedules that apply to one service on one day.
async fn get_schedules(
    State(state): State<AppState>,
    Path((identifier_type, identifier)): Path<(String, String)>,
    Query(params): Query<ScheduleParams>,
) -> Result<Json<Vec<EnrichedSchedule>>, AppError> {
    let query = ScheduleQuery::parse(
        &identifier_type,
        &identifier,
        params.date.as_deref(),
        params.toc.as_deref(),
        params.location.as_deref(),
        Utc::now().date_naive(),
    )?;

    let schedules = state.resolver.resolve(&query).await?;
    if schedules.is_empty() {
        return Err(AppError::NotFound {
            message: format!(
                "no schedules for {} {} on {}",
                query.identifier_type, query.identifier, query.date
            ),
        });
    }

    debug!(identifier = %query.identifier, count = schedules.len(), "schedules found");
    Ok(Json(schedules))
}

/// Start a background reload of the full feed.
async fn refresh(State(state): State<AppState>) -> Result<(StatusCode, Json<&'static str>), AppError> {
    let Some(guard) = state.pipeline.try_acquire() else {
        return Err(AppError::Conflict {
            message: "Database already being refreshed. Please try again later".to_string(),
        });
    };

    info!(path = %state.feed_path.display(), "refresh requested");
    state.spawn_refresh(guard);
    Ok((StatusCode::CREATED, Json("Refreshing")))
}

/// Stored schedule counts by source.
async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let counts = state.store.counts().await?;
    Ok(Json(StatusResponse::new(&counts, state.pipeline.is_running())))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Internal { message: String },
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::UnrecognisedIdentifierType(_) | ResolveError::InvalidDate(_) => {
                AppError::BadRequest {
                    message: e.to_string(),
                }
            }
            ResolveError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::config::ServerConfig;
    use crate::store::MemoryStore;

    const FEED_FIXTURE: &str = include_str!("../../data/fixtures/feed.json");

    fn feed_file(dir: &std::path::Path) -> std::path::PathBuf {
        let header = json!({"JsonTimetableV1": {
            "classification": "public",
            "timestamp": 1_697_155_200,
            "owner": "Network Rail",
            "Sender": {"organisation": "Rockshore", "application": "NTROD", "component": "SCHEDULE"},
            "Metadata": {"type": "full", "sequence": 1}
        }});
        let schedule: serde_json::Value = serde_json::from_str(FEED_FIXTURE).unwrap();
        let path = dir.join("schedule.json");
        std::fs::write(&path, format!("{header}\n{schedule}\n")).unwrap();
        path
    }

    fn state_for(dir: &std::path::Path) -> AppState {
        let config = ServerConfig::default()
            .with_feed_path(feed_file(dir))
            .with_snapshot_path(dir.join("snapshot.json"))
            .with_stomp_url(None);
        AppState::new(Arc::new(MemoryStore::new()), &config)
    }

    fn params(date: &str) -> ScheduleParams {
        ScheduleParams {
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    async fn refreshed(state: &AppState) {
        let (status, _) = refresh(State(state.clone())).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        while state.pipeline.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn health_check() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn refresh_then_query() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());
        refreshed(&state).await;

        let Json(body) = status(State(state.clone())).await.unwrap();
        assert_eq!(body.schedule_file_count, 1);
        assert_eq!(body.vstp_count, 0);
        assert!(!body.refreshing);

        // 2023-10-15 is a Sunday
        let Json(found) = get_schedules(
            State(state.clone()),
            Path(("headcode".to_string(), "2A20".to_string())),
            Query(params("2023-10-15")),
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].schedule.train_uid, "C45871");
        assert_eq!(found[0].origin.as_deref(), Some("DRBY"));

        let err = get_schedules(
            State(state.clone()),
            Path(("headcode".to_string(), "2A20".to_string())),
            Query(params("2023-10-16")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn refresh_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());
        refreshed(&state).await;

        // The snapshot is written after the flag is released
        let snapshot_path = dir.path().join("snapshot.json");
        for _ in 0..200 {
            if snapshot_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let saved = state.snapshot.as_ref().unwrap().load().await.unwrap().unwrap();
        assert_eq!(saved.schedules.len(), 1);
        assert_eq!(saved.timetables.len(), 1);
    }

    #[tokio::test]
    async fn refresh_conflicts_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        let guard = state.pipeline.try_acquire().unwrap();
        let err = refresh(State(state.clone())).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

        let Json(body) = status(State(state.clone())).await.unwrap();
        assert!(body.refreshing);
        drop(guard);

        let (code, Json(message)) = refresh(State(state.clone())).await.unwrap();
        assert_eq!(code, StatusCode::CREATED);
        assert_eq!(message, "Refreshing");
    }

    #[tokio::test]
    async fn query_misuse_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        let err = get_schedules(
            State(state.clone()),
            Path(("rid".to_string(), "2A20".to_string())),
            Query(ScheduleParams::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = get_schedules(
            State(state.clone()),
            Path(("trainuid".to_string(), "C45871".to_string())),
            Query(params("13/10/2023")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());
        state.store.set_available(false);

        let err = get_schedules(
            State(state.clone()),
            Path(("trainuid".to_string(), "C45871".to_string())),
            Query(params("2023-10-15")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = status(State(state)).await.unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[test]
    fn status_body_field_names() {
        let counts = crate::store::StoreCounts {
            feed: 3,
            vstp: 2,
            tiplocs: 7,
            timetables: 1,
        };
        let value = serde_json::to_value(StatusResponse::new(&counts, false)).unwrap();
        assert_eq!(
            value,
            json!({"ScheduleFileCount": 3, "VSTPCount": 2, "tiplocs": 7, "refreshing": false})
        );
    }
}
