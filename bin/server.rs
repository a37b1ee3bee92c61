// Parkwatch - Web Server
// JSON API + single-page dashboard with Axum

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use parkwatch::{
    now_string, Analytics, Config, ExitOutcome, NewEntry, ParkingError, ParkingLot, RateEntry,
    SlotDrift, SlotRecord, VehicleRecord,
};

/// Shared application state
///
/// One mutex around the whole lot: requests are served one at a time against
/// the in-memory tables, so two writers can never interleave a rewrite.
#[derive(Clone)]
struct AppState {
    lot: Arc<Mutex<ParkingLot>>,
}

impl AppState {
    fn lot(&self) -> MutexGuard<'_, ParkingLot> {
        self.lot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn error_response(err: ParkingError) -> Response {
    let status = match &err {
        ParkingError::RateNotFound(_)
        | ParkingError::InvalidTimestamp { .. }
        | ParkingError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ParkingError::DuplicateActiveToken(_) | ParkingError::AmbiguousToken { .. } => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("Request failed: {}", err);
    }

    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(err.to_string()),
        }),
    )
        .into_response()
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
}

#[derive(Deserialize)]
struct ExitRequest {
    token: String,
    /// Defaults to now
    #[serde(default)]
    exit_time: Option<String>,
}

/// Entry body; `entry_time` defaults to now
#[derive(Deserialize)]
struct EntryRequest {
    token: String,
    license: String,
    vehicle_type: String,
    #[serde(default)]
    entry_time: Option<String>,
    slot: String,
}

impl From<EntryRequest> for NewEntry {
    fn from(req: EntryRequest) -> Self {
        Self {
            token: req.token,
            license: req.license,
            vehicle_type: req.vehicle_type,
            entry_time: req.entry_time.unwrap_or_else(now_string),
            slot: req.slot,
        }
    }
}

/// Analytics plus the per-status counts for the chart
#[derive(Serialize)]
struct AnalyticsResponse {
    #[serde(flatten)]
    totals: Analytics,
    status_counts: Vec<StatusCount>,
}

#[derive(Serialize)]
struct StatusCount {
    status: String,
    count: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/vehicles - Whole ledger
async fn get_vehicles(State(state): State<AppState>) -> Response {
    let records: Vec<VehicleRecord> = state.lot().ledger().records().to_vec();
    ApiResponse::ok(records)
}

/// GET /api/search?q= - Token or license lookup (empty list when no match)
async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    ApiResponse::ok(state.lot().search(params.q.trim()))
}

/// POST /api/vehicles - Record an entry
async fn add_vehicle(State(state): State<AppState>, Json(req): Json<EntryRequest>) -> Response {
    match state.lot().record_entry(req.into()) {
        Ok(record) => ApiResponse::ok(record),
        Err(e) => error_response(e),
    }
}

/// POST /api/exit - Record an exit and return the rent
async fn record_exit(State(state): State<AppState>, Json(req): Json<ExitRequest>) -> Response {
    let exit_time = req.exit_time.unwrap_or_else(now_string);
    match state.lot().record_exit(req.token.trim(), &exit_time) {
        Ok(outcome) => ApiResponse::<ExitOutcome>::ok(outcome),
        Err(e) => error_response(e),
    }
}

/// GET /api/layout - Slot rows
async fn get_layout(State(state): State<AppState>) -> Response {
    let slots: Vec<SlotRecord> = state.lot().layout_rows().to_vec();
    ApiResponse::ok(slots)
}

/// GET /api/layout/drift - Slots disagreeing with parked vehicles
async fn get_layout_drift(State(state): State<AppState>) -> Response {
    let drift: Vec<SlotDrift> = state.lot().layout_drift();
    ApiResponse::ok(drift)
}

/// GET /api/analytics - Totals and status distribution
async fn get_analytics(State(state): State<AppState>) -> Response {
    let lot = state.lot();
    let response = AnalyticsResponse {
        totals: lot.analytics(),
        status_counts: lot
            .status_counts()
            .into_iter()
            .map(|(status, count)| StatusCount {
                status: status.to_string(),
                count,
            })
            .collect(),
    };
    ApiResponse::ok(response)
}

/// GET /api/rates - Rate table (feeds the vehicle type selector)
async fn get_rates(State(state): State<AppState>) -> Response {
    let rates: Vec<RateEntry> = state.lot().rates().entries().to_vec();
    ApiResponse::ok(rates)
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("🌐 Parkwatch - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    let lot = match ParkingLot::open(&config) {
        Ok(lot) => lot,
        Err(e) => {
            eprintln!("❌ Could not open parking data in {}", config.data_dir.display());
            eprintln!("   {}", e);
            std::process::exit(1);
        }
    };
    println!("✓ Data loaded from {}", config.data_dir.display());

    // Create shared state
    let state = AppState {
        lot: Arc::new(Mutex::new(lot)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/vehicles", get(get_vehicles).post(add_vehicle))
        .route("/search", get(search))
        .route("/exit", axum::routing::post(record_exit))
        .route("/layout", get(get_layout))
        .route("/layout/drift", get(get_layout_drift))
        .route("/analytics", get(get_analytics))
        .route("/rates", get(get_rates))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let listener = tokio::net::TcpListener::bind(config.server_addr.as_str()).await?;

    println!("\n🚀 Server running on http://{}", config.server_addr);
    println!("   API: http://{}/api/vehicles", config.server_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
