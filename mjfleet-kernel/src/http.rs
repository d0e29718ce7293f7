/**
 * API REST MJFLEET - Surface HTTP du kernel
 *
 * RÔLE :
 * Expose les cinq vues du tableau de bord en JSON, plus l'accès brut au
 * registre, la table d'alarmes et l'état de santé.
 *
 * ROUTES :
 * - /, /dashboard         : statistiques de flotte + cartes machines
 * - /overview?q=          : tableau filtré (nom ou modèle)
 * - /details?machine=     : fiche machine, repli sur la première si inconnue
 * - /users, /devices      : tables d'administration (lecture seule)
 * - /machines[/{id}]      : snapshot brut
 * - /alarms               : historique statique des alarmes
 * - /health, /system/health
 *
 * SÉCURITÉ :
 * Si MJFLEET_API_KEY est défini, header x-api-key obligatoire sauf /health*.
 */

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

use crate::health::{HealthTracker, KernelHealth};
use crate::models::{Alarm, Machine, User};
use crate::state::FleetReader;
use crate::views::{self, DashboardView, DetailView, DeviceRow, OverviewView, UserRow};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("machine not found: {0}")]
    MachineNotFound(String),
    #[error("fleet is empty")]
    EmptyFleet,
    #[error("missing or invalid api key")]
    Unauthorized,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MachineNotFound(_) | ApiError::EmptyFleet => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub fleet: FleetReader,
    pub alarms: Arc<Vec<Alarm>>,
    pub users: Arc<Vec<User>>,
    pub health_tracker: HealthTracker,
    pub api_key: Option<String>,
}

async fn require_api_key(
    State(app): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Health check toujours accessible
    if req.uri().path().starts_with("/health") {
        return Ok(next.run(req).await);
    }
    let Some(expected) = app.api_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    let ok = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !ok {
        warn!(path = %req.uri().path(), "rejected request without valid api key");
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/", get(get_dashboard))
        .route("/dashboard", get(get_dashboard))
        .route("/overview", get(get_overview))
        .route("/details", get(get_details))
        .route("/users", get(get_users))
        .route("/devices", get(get_devices))
        .route("/machines", get(list_machines))
        .route("/machines/{id}", get(get_machine))
        .route("/alarms", get(list_alarms))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_api_key))
        .with_state(app_state)
}

// GET / et /dashboard
async fn get_dashboard(State(app): State<AppState>) -> Json<DashboardView> {
    Json(views::dashboard(&app.fleet.snapshot()))
}

#[derive(Debug, Deserialize)]
struct OverviewParams {
    #[serde(default)]
    q: String,
}

// GET /overview?q=
async fn get_overview(
    State(app): State<AppState>,
    Query(params): Query<OverviewParams>,
) -> Json<OverviewView> {
    Json(views::overview(&app.fleet.snapshot(), &params.q))
}

#[derive(Debug, Deserialize)]
struct DetailParams {
    machine: Option<String>,
}

// GET /details?machine=
async fn get_details(
    State(app): State<AppState>,
    Query(params): Query<DetailParams>,
) -> Result<Json<DetailView>, ApiError> {
    let snap = app.fleet.snapshot();
    views::details(&snap, &app.alarms, params.machine.as_deref())
        .map(Json)
        .ok_or(ApiError::EmptyFleet)
}

// GET /users
async fn get_users(State(app): State<AppState>) -> Json<Vec<UserRow>> {
    Json(views::users(&app.users))
}

// GET /devices
async fn get_devices(State(app): State<AppState>) -> Json<Vec<DeviceRow>> {
    Json(views::devices(&app.fleet.snapshot()))
}

#[derive(Debug, Serialize)]
struct MachinesView {
    version: u64,
    updated_at: String,
    machines: Vec<Machine>,
}

// GET /machines (snapshot brut)
async fn list_machines(State(app): State<AppState>) -> Json<MachinesView> {
    let snap = app.fleet.snapshot();
    Json(MachinesView {
        version: snap.version,
        updated_at: snap.updated_at.format(&Rfc3339).unwrap_or_default(),
        machines: snap.machines.clone(),
    })
}

// GET /machines/{id} (pas de repli ici : id inconnu = 404)
async fn get_machine(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Machine>, ApiError> {
    let snap = app.fleet.snapshot();
    let Some(m) = snap.get(&id) else {
        return Err(ApiError::MachineNotFound(id));
    };
    Ok(Json(m.clone()))
}

// GET /alarms
async fn list_alarms(State(app): State<AppState>) -> Json<Vec<Alarm>> {
    Json(app.alarms.as_ref().clone())
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health(&app.fleet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MachineStatus;
    use crate::seed::{initial_alarms, initial_machines, initial_users};
    use crate::state::{FleetRegistry, FleetWriter};
    use mjfleet_devkit::TestHarness;

    fn app(api_key: Option<&str>) -> (FleetWriter, TestHarness) {
        let (writer, fleet) = FleetRegistry::new(initial_machines());
        let state = AppState {
            fleet,
            alarms: Arc::new(initial_alarms()),
            users: Arc::new(initial_users()),
            health_tracker: HealthTracker::new(),
            api_key: api_key.map(str::to_string),
        };
        (writer, TestHarness::new(build_router(state)))
    }

    #[tokio::test]
    async fn test_dashboard_open_rate() {
        let (_w, harness) = app(None);
        let (status, body) = harness.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["open_rate"], 25);
        assert_eq!(body["machines"].as_array().unwrap().len(), 4);

        let (_, same) = harness.get("/dashboard").await;
        assert_eq!(same["open_rate"], 25);
    }

    #[tokio::test]
    async fn test_overview_query() {
        let (_w, harness) = app(None);
        let (status, body) = harness.get("/overview?q=MJ-C").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "m2");

        let (_, empty) = harness.get("/overview?q=nope").await;
        assert!(empty["rows"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_details_fallback() {
        let (_w, harness) = app(None);
        let (status, body) = harness.get("/details?machine=m404").await;
        assert_eq!(status, StatusCode::OK);
        harness.assert_field_equals(&body, "selected_id", &serde_json::json!("m4")).unwrap();
        assert_eq!(body["fell_back"], true);

        let (_, body) = harness.get("/details?machine=m1").await;
        assert_eq!(body["selected_id"], "m1");
        assert_eq!(body["machine"]["status"], "debugging");
        assert_eq!(body["alarms"][0]["id"], "a3");
    }

    #[tokio::test]
    async fn test_details_empty_fleet_is_404() {
        let (writer, harness) = app(None);
        writer.commit(Vec::new());
        let (status, body) = harness.get("/details").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "fleet is empty");
    }

    #[tokio::test]
    async fn test_views_follow_latest_snapshot() {
        let (writer, harness) = app(None);
        let mut machines = writer.current().machines.clone();
        machines[1].status = MachineStatus::Running;
        writer.commit(machines);

        let (_, body) = harness.get("/").await;
        assert_eq!(body["open_rate"], 50);
        let (_, devices) = harness.get("/devices").await;
        assert_eq!(devices[1]["status"], "running");
    }

    #[tokio::test]
    async fn test_machine_lookup() {
        let (_w, harness) = app(None);
        let (status, body) = harness.get("/machines/m3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], "MJ-C-D10");

        let (status, _) = harness.get("/machines/m9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, all) = harness.get("/machines").await;
        assert_eq!(all["version"], 0);
        assert_eq!(all["machines"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_static_tables() {
        let (_w, harness) = app(None);
        let (_, users) = harness.get("/users").await;
        assert_eq!(users.as_array().unwrap().len(), 4);
        assert_eq!(users[0]["initials"], "AD");

        let (_, alarms) = harness.get("/alarms").await;
        assert_eq!(alarms.as_array().unwrap().len(), 4);
        assert_eq!(alarms[3]["severity"], "high");
    }

    #[tokio::test]
    async fn test_api_key_enforced() {
        let (_w, harness) = app(Some("secret"));

        let (status, _) = harness.get("/overview").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = harness.get_with_header("/overview", "x-api-key", "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = harness.get_with_header("/overview", "x-api-key", "secret").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = harness.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = harness.get("/system/health").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, body) = harness.get_with_header("/system/health", "x-api-key", "secret").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["machines_tracked"], 4);
    }
}
