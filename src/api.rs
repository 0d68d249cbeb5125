//! REST API Server for the risk analysis console
//!
//! Exposes console sessions over HTTP. Each session owns one orchestrator;
//! mounting creates it, unmounting discards it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classifier::{QuickAction, Submission};
use crate::config::ConsoleConfig;
use crate::gateway::AnalysisGateway;
use crate::orchestrator::{AnalysisOrchestrator, RejectReason, SubmitOutcome};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Optional client key; the same key maps to the same session
    pub client_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    gateway: Arc<dyn AnalysisGateway>,
    config: Arc<ConsoleConfig>,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<AnalysisOrchestrator>>>>,
}

impl ApiState {
    pub fn new(gateway: Arc<dyn AnalysisGateway>, config: ConsoleConfig) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn session(&self, id: Uuid) -> Option<Arc<AnalysisOrchestrator>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Discard sessions whose transcript has been quiet for at least `ttl`.
    /// Busy sessions are always kept. Returns how many were removed.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let now = chrono::Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, session| {
            let idle = (now - session.last_activity()).to_std().unwrap_or_default();
            let keep = session.is_busy() || idle < ttl;
            if !keep {
                info!(session_id = %id, idle_secs = idle.as_secs(), "Evicting idle session");
            }
            keep
        });

        before - sessions.len()
    }
}

const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn spawn_idle_sweeper(state: ApiState, ttl: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = ttl.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let evicted = state.evict_idle(ttl).await;
            if evicted > 0 {
                debug!(evicted, "Idle session sweep");
            }
        }
    })
}

/// =============================
/// Helpers
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

fn session_id_for(client_key: Option<&str>) -> Uuid {
    match client_key {
        Some(key) if !key.trim().is_empty() => {
            Uuid::parse_str(key).unwrap_or_else(|_| stable_uuid_from_string(key))
        }
        _ => Uuid::new_v4(),
    }
}

fn session_not_found(id: Uuid) -> ApiResult {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(format!("Session {} not found", id))),
    )
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Session Lifecycle
/// =============================

/// Mount a session. Sessions live until deleted or, when an idle TTL is
/// configured, until the sweeper finds them quiet for that long.
async fn create_session(
    State(state): State<ApiState>,
    body: Option<Json<CreateSessionRequest>>,
) -> ApiResult {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let session_id = session_id_for(request.client_key.as_deref());

    let mut sessions = state.sessions.write().await;
    if let Some(existing) = sessions.get(&session_id) {
        return (StatusCode::OK, Json(ApiResponse::success(existing.snapshot())));
    }

    let orchestrator = Arc::new(
        AnalysisOrchestrator::from_config(state.gateway.clone(), &state.config)
            .with_session_id(session_id),
    );
    let snapshot = orchestrator.snapshot();
    sessions.insert(session_id, orchestrator);

    info!(%session_id, active_sessions = sessions.len(), "Session created");
    (StatusCode::CREATED, Json(ApiResponse::success(snapshot)))
}

async fn get_session(State(state): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult {
    match state.session(id).await {
        Some(session) => (StatusCode::OK, Json(ApiResponse::success(session.snapshot()))),
        None => session_not_found(id),
    }
}

async fn delete_session(State(state): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            info!(session_id = %id, "Session discarded");
            (
                StatusCode::OK,
                Json(ApiResponse::success(serde_json::json!({ "session_id": id }))),
            )
        }
        None => session_not_found(id),
    }
}

/// =============================
/// Submissions
/// =============================

async fn post_message(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult {
    submit(&state, id, Submission::Text(req.text)).await
}

async fn post_quick_action(
    State(state): State<ApiState>,
    Path((id, action)): Path<(Uuid, String)>,
) -> ApiResult {
    let Some(action) = QuickAction::from_key(&action) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Unknown quick action: {}", action))),
        );
    };

    submit(&state, id, Submission::Quick(action)).await
}

async fn submit(state: &ApiState, id: Uuid, submission: Submission) -> ApiResult {
    let Some(session) = state.session(id).await else {
        return session_not_found(id);
    };

    match session.submit(submission).await {
        SubmitOutcome::Completed(outcome) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "outcome": outcome.kind(),
                "session": session.snapshot(),
            }))),
        ),
        SubmitOutcome::Rejected(RejectReason::EmptyInput) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Empty submission".into())),
        ),
        SubmitOutcome::Rejected(RejectReason::Busy) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::error("An analysis is already running for this session".into())),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/messages", post(post_message))
        .route("/api/sessions/:id/quick-actions/:action", post(post_quick_action))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if let Some(ttl) = state.config.session_idle_ttl {
        info!(idle_ttl_secs = ttl.as_secs(), "Idle session sweeper enabled");
        let _sweeper = spawn_idle_sweeper(state.clone(), ttl);
    }

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Gate, ScriptedGateway};

    async fn state_with_session(gateway: ScriptedGateway) -> (ApiState, Arc<AnalysisOrchestrator>) {
        let state = ApiState::new(Arc::new(gateway), ConsoleConfig::default());
        let session = Arc::new(AnalysisOrchestrator::from_config(
            state.gateway.clone(),
            &state.config,
        ));
        state
            .sessions
            .write()
            .await
            .insert(session.session_id(), session.clone());
        (state, session)
    }

    #[tokio::test]
    async fn test_evict_idle_sessions() {
        let (state, session) = state_with_session(ScriptedGateway::new()).await;

        assert_eq!(state.evict_idle(Duration::from_secs(3600)).await, 0);
        assert!(state.session(session.session_id()).await.is_some());

        assert_eq!(state.evict_idle(Duration::ZERO).await, 1);
        assert!(state.session(session.session_id()).await.is_none());
    }

    #[tokio::test]
    async fn test_busy_session_survives_eviction() {
        let gate = Gate::default();
        let (state, session) =
            state_with_session(ScriptedGateway::new().with_gate(gate.clone())).await;

        let running = {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .submit(Submission::Quick(QuickAction::TechStart))
                    .await
            })
        };
        gate.entered.notified().await;

        assert_eq!(state.evict_idle(Duration::ZERO).await, 0);

        gate.release.notify_one();
        running.await.unwrap();
        assert_eq!(state.evict_idle(Duration::ZERO).await, 1);
    }

    #[test]
    fn test_stable_session_ids() {
        let a = session_id_for(Some("browser-tab-1"));
        let b = session_id_for(Some("browser-tab-1"));
        let c = session_id_for(Some("browser-tab-2"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.get_version_num(), 4);
    }

    #[test]
    fn test_uuid_client_key_used_verbatim() {
        let id = Uuid::new_v4();
        assert_eq!(session_id_for(Some(&id.to_string())), id);
    }

    #[test]
    fn test_blank_client_key_gets_fresh_id() {
        assert_ne!(session_id_for(Some("  ")), session_id_for(None));
    }
}
