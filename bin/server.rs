// Trip Split - Web Server
// Read API over a loaded expense export, for the presentation layer

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use trip_split::{
    category_breakdown, for_trip, load_expenses, logging, net_settlement, newest_first,
    AppConfig, CategoryShare, ExpenseFeed, ExpenseRecord, ParticipantId, RejectedRecord,
    Settlement, SettlementEngine, Summary,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<SettlementEngine>,
    feed: Arc<ExpenseFeed>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

#[derive(Serialize)]
struct SummaryResponse {
    reference_currency: String,
    expense_count: usize,
    people: Summary,
    categories: Vec<PersonCategories>,
    settlement: Option<Settlement>,
    /// Set when the totals overflowed and no settlement could be derived
    #[serde(skip_serializing_if = "Option::is_none")]
    settlement_error: Option<String>,
    rejected: Vec<RejectedRecord>,
}

#[derive(Serialize)]
struct PersonCategories {
    participant: ParticipantId,
    breakdown: Vec<CategoryShare>,
}

#[derive(Deserialize)]
struct TripQuery {
    trip: Option<String>,
}

impl AppState {
    fn records<'a>(&'a self, trip: Option<&'a str>) -> Vec<&'a ExpenseRecord> {
        match trip {
            Some(trip) => for_trip(&self.feed.records, trip).collect(),
            None => self.feed.records.iter().collect(),
        }
    }

    fn summarise(&self, trip: Option<&str>) -> SummaryResponse {
        let records = self.records(trip);
        let report = self.engine.compute_lenient(records.iter().copied());

        let categories = report
            .summary
            .iter()
            .map(|(participant, person)| PersonCategories {
                participant: participant.clone(),
                breakdown: category_breakdown(person),
            })
            .collect();

        let (settlement, settlement_error) = match net_settlement(&report.summary, self.engine.roster()) {
            Ok(settlement) => (settlement, None),
            Err(e) => (None, Some(e.to_string())),
        };

        SummaryResponse {
            reference_currency: self.engine.rates().reference().to_string(),
            expense_count: records.len(),
            settlement,
            settlement_error,
            people: report.summary,
            categories,
            rejected: report.rejected,
        }
    }

    fn listing(&self, trip: Option<&str>) -> Vec<ExpenseRecord> {
        let records: Vec<ExpenseRecord> = self.records(trip).into_iter().cloned().collect();
        newest_first(&records).into_iter().cloned().collect()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/expenses?trip= - Expenses, newest first
async fn get_expenses(State(state): State<AppState>, Query(query): Query<TripQuery>) -> impl IntoResponse {
    let expenses = state.listing(query.trip.as_deref());
    (StatusCode::OK, Json(ApiResponse::ok(expenses)))
}

/// GET /api/trips/:trip_id/expenses - Expenses of one trip
async fn get_trip_expenses(State(state): State<AppState>, Path(trip_id): Path<String>) -> impl IntoResponse {
    let expenses = state.listing(Some(&trip_id));
    (StatusCode::OK, Json(ApiResponse::ok(expenses)))
}

/// GET /api/summary?trip= - Spent/owed per person
async fn get_summary(State(state): State<AppState>, Query(query): Query<TripQuery>) -> impl IntoResponse {
    let summary = state.summarise(query.trip.as_deref());
    (StatusCode::OK, Json(ApiResponse::ok(summary)))
}

/// GET /api/trips/:trip_id/summary - Spent/owed per person for one trip
async fn get_trip_summary(State(state): State<AppState>, Path(trip_id): Path<String>) -> impl IntoResponse {
    let summary = state.summarise(Some(&trip_id));
    (StatusCode::OK, Json(ApiResponse::ok(summary)))
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(get_expenses))
        .route("/summary", get(get_summary))
        .route("/trips/:trip_id/expenses", get(get_trip_expenses))
        .route("/trips/:trip_id/summary", get(get_trip_summary))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var_os("TRIP_SPLIT_CONFIG").map(std::path::PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    logging::init(&config.log_level);

    let data_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TRIP_SPLIT_DATA").ok())
        .context("Usage: split-server <payments.json|payments.csv> (or set TRIP_SPLIT_DATA)")?;

    let feed = load_expenses(&data_path)?;
    info!(path = %data_path, records = feed.records.len(), rejected = feed.rejected.len(), "expenses loaded");

    let state = AppState {
        engine: Arc::new(config.engine()?),
        feed: Arc::new(feed),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "server running, summary at /api/summary");

    axum::serve(listener, router(state))
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_split::decode_expenses;

    const EXPORT: &str = r#"[
        {"id": "1", "createdAt": {"seconds": 10, "nanoseconds": 0}, "paidBy": "DS", "currency": "SGD",
         "amount": 60, "description": "Satay", "payment": "Split equally", "category": "Dining", "trip_id": "sg"},
        {"id": "2", "createdAt": {"seconds": 30, "nanoseconds": 0}, "paidBy": "KT", "currency": "MYR",
         "amount": 69, "description": "Hotel", "payment": "Owed full amount", "category": "Accommodation", "trip_id": "kl"},
        {"id": "3", "createdAt": {"seconds": 20, "nanoseconds": 0}, "paidBy": "XX", "currency": "SGD",
         "amount": 5, "description": "Stranger", "payment": "Tracking", "trip_id": "sg"},
        {"id": "4", "createdAt": {"seconds": 40, "nanoseconds": 0}, "paidBy": "KT", "currency": "SGD",
         "amount": 8, "description": "Kopi", "payment": "Tracking", "category": "Dining", "trip_id": "sg"}
    ]"#;

    fn state() -> AppState {
        let engine = AppConfig::default().engine().unwrap();
        AppState {
            engine: Arc::new(engine),
            feed: Arc::new(decode_expenses(EXPORT).unwrap()),
        }
    }

    #[test]
    fn test_trip_summary_is_lenient() {
        let summary = state().summarise(Some("sg"));

        assert_eq!(summary.reference_currency, "SGD");
        assert_eq!(summary.expense_count, 3);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(summary.rejected[0].id.as_deref(), Some("3"));

        let kt = summary.people.get(&ParticipantId::from("KT")).unwrap();
        assert_eq!(kt.spent, 38.0);
        assert_eq!(kt.owed, 30.0);

        let settlement = summary.settlement.unwrap();
        assert_eq!(settlement.debtor.as_str(), "KT");
        assert_eq!(settlement.amount, 30.0);
        assert!(summary.settlement_error.is_none());
    }

    #[test]
    fn test_other_trip_is_excluded() {
        let summary = state().summarise(Some("kl"));

        assert_eq!(summary.expense_count, 1);
        assert!(summary.rejected.is_empty());
        let ds = summary.people.get(&ParticipantId::from("DS")).unwrap();
        assert!((ds.owed - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_listing_is_newest_first() {
        let state = state();

        let all: Vec<String> = state.listing(None).into_iter().map(|r| r.id).collect();
        assert_eq!(all, vec!["4", "2", "3", "1"]);

        let sg: Vec<String> = state.listing(Some("sg")).into_iter().map(|r| r.id).collect();
        assert_eq!(sg, vec!["4", "3", "1"]);
    }
}
