// Circulation Insights - Web Server
// REST facade over the report engines with Axum

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use circulation_insights::{
    AffinityEngine, CirculationEngine, EngineError, PatronEngine, SqliteLedger,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    ledger: Arc<Mutex<SqliteLedger>>,
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

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(detail: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(detail),
        }
    }
}

/// Map the engine taxonomy onto HTTP statuses.
fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::FailedPrecondition(_) => StatusCode::PRECONDITION_FAILED,
        EngineError::Internal(_) | EngineError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: Result<T, EngineError>) -> axum::response::Response {
    match result {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::ok(report))).into_response(),
        Err(err) => {
            eprintln!("Report failed [{}]: {}", err.kind(), err);
            (
                status_for(&err),
                Json(ApiResponse::<()>::err(err.to_string())),
            )
                .into_response()
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/items/most-borrowed/:limit
async fn most_borrowed(
    State(state): State<AppState>,
    Path(limit): Path<i64>,
) -> impl IntoResponse {
    let ledger = state.ledger.lock().unwrap();
    respond(CirculationEngine::new(&*ledger).top_borrowed(limit))
}

/// GET /api/items/:id/availability
async fn availability(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let ledger = state.ledger.lock().unwrap();
    respond(CirculationEngine::new(&*ledger).availability(id))
}

/// GET /api/items/:id/related
async fn related_items(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let ledger = state.ledger.lock().unwrap();
    respond(AffinityEngine::new(&*ledger).related_items(id))
}

/// GET /api/items/:id/reading-rate
async fn reading_rate(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let ledger = state.ledger.lock().unwrap();
    respond(AffinityEngine::new(&*ledger).reading_rate(id))
}

#[derive(Deserialize)]
struct WindowParams {
    start: String,
    end: String,
    #[serde(default)]
    limit: Option<i64>,
}

/// Inclusive window: start-of-day to end-of-day UTC.
fn parse_window(params: &WindowParams) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
    let parse = |raw: &str, label: &str| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| format!("{} must be YYYY-MM-DD, got {:?}", label, raw))
    };

    let start = parse(&params.start, "start")?;
    let end = parse(&params.end, "end")?;

    Ok((
        start.and_hms_opt(0, 0, 0).unwrap().and_utc(),
        end.and_hms_opt(23, 59, 59).unwrap().and_utc(),
    ))
}

/// GET /api/patrons/top?start=YYYY-MM-DD&end=YYYY-MM-DD&limit=N
async fn top_patrons(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> impl IntoResponse {
    let (start, end) = match parse_window(&params) {
        Ok(window) => window,
        Err(detail) => {
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(detail)))
                .into_response()
        }
    };
    let limit = params.limit.unwrap_or(10);

    let ledger = state.ledger.lock().unwrap();
    respond(PatronEngine::new(&*ledger).top_patrons(start, end, limit))
}

/// GET /api/patrons/:id/items?start=YYYY-MM-DD&end=YYYY-MM-DD
async fn patron_items(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<WindowParams>,
) -> impl IntoResponse {
    let (start, end) = match parse_window(&params) {
        Ok(window) => window,
        Err(detail) => {
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(detail)))
                .into_response()
        }
    };

    let ledger = state.ledger.lock().unwrap();
    respond(PatronEngine::new(&*ledger).patron_items(id, start, end))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Circulation Insights - Web Server");

    let db_path = std::env::var("CIRCULATION_DB").unwrap_or_else(|_| "circulation.db".to_string());
    let db_path = std::path::Path::new(&db_path);

    if !db_path.exists() {
        eprintln!("❌ Database not found at {:?}", db_path);
        eprintln!("   Run: circulation-insights init");
        std::process::exit(1);
    }

    let ledger = SqliteLedger::open(db_path).expect("Failed to open database");
    println!("✓ Database opened: {:?}", db_path);

    let state = AppState {
        ledger: Arc::new(Mutex::new(ledger)),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/items/most-borrowed/:limit", get(most_borrowed))
        .route("/items/:id/availability", get(availability))
        .route("/items/:id/related", get(related_items))
        .route("/items/:id/reading-rate", get(reading_rate))
        .route("/patrons/top", get(top_patrons))
        .route("/patrons/:id/items", get(patron_items))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Try: http://localhost:3000/api/items/most-borrowed/5");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
