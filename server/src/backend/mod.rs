//! # Backend Module
//!
//! Everything behind the HTTP surface of the coop ledger:
//! - **Domain**: business rules for members, contributions, loans and settings
//! - **Storage**: access to the hosted Postgres backend
//! - **IO**: the REST API exposing the domain services
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (services, eligibility gate, derived metrics)
//!     ↓
//! Storage Layer (repositories, query cache, remote connection)
//! ```

pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use log::info;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::domain::{
    ActivityLogService, ContributionService, DashboardService, EligibilityService, ExportService, LoanService,
    MemberService, SettingsService,
};
use crate::backend::storage::{RemoteConnection, Storage};
use crate::config::AppConfig;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub member_service: MemberService,
    pub contribution_service: ContributionService,
    pub eligibility_service: EligibilityService,
    pub loan_service: LoanService,
    pub settings_service: SettingsService,
    pub activity_log_service: ActivityLogService,
    pub dashboard_service: DashboardService,
    pub export_service: ExportService,
}

impl AppState {
    /// Wire every service over `storage`; each cache holds up to `cache_capacity` entries
    pub fn new(storage: Storage, cache_capacity: usize) -> Self {
        let activity_log_service = ActivityLogService::new(storage.activity_logs.clone());
        let settings_service = SettingsService::new(
            storage.settings.clone(),
            activity_log_service.clone(),
            cache_capacity,
        );
        let contribution_service = ContributionService::new(
            storage.contributions.clone(),
            storage.members.clone(),
            activity_log_service.clone(),
            cache_capacity,
        );
        let eligibility_service = EligibilityService::new(
            storage.members.clone(),
            contribution_service.clone(),
            settings_service.clone(),
        );
        let loan_service = LoanService::new(
            storage.loans.clone(),
            storage.members.clone(),
            contribution_service.clone(),
            eligibility_service.clone(),
            settings_service.clone(),
            activity_log_service.clone(),
        );
        let member_service = MemberService::new(
            storage.members.clone(),
            storage.files.clone(),
            activity_log_service.clone(),
        );
        let dashboard_service = DashboardService::new(contribution_service.clone(), storage.members.clone());
        let export_service = ExportService::new(
            storage.contributions.clone(),
            storage.members.clone(),
            activity_log_service.clone(),
        );

        Self {
            member_service,
            contribution_service,
            eligibility_service,
            loan_service,
            settings_service,
            activity_log_service,
            dashboard_service,
            export_service,
        }
    }
}

/// Initialize the backend against the configured remote project
pub fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Connecting to backend at {}", config.supabase_url);
    let conn = RemoteConnection::from_config(config).context("Failed to create backend client")?;

    info!("Setting up domain services (cache capacity {})", config.cache_capacity);
    let storage = Storage::remote(conn, &config.avatar_bucket);

    Ok(AppState::new(storage, config.cache_capacity))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: Option<&str>) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
        .allow_headers(Any);
    let cors = match cors_origin {
        Some(origin) => cors.allow_origin(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))?,
        ),
        None => cors.allow_origin(Any),
    };

    let api_routes = Router::new()
        .nest("/members", io::rest::member_apis::router())
        .nest("/contributions", io::rest::contribution_apis::router())
        .nest("/eligibility", io::rest::eligibility_apis::router())
        .nest("/loans", io::rest::loan_apis::router())
        .nest("/settings", io::rest::settings_apis::router())
        .nest("/activity-logs", io::rest::activity_log_apis::router())
        .nest("/dashboard", io::rest::dashboard_apis::router())
        .nest("/export", io::rest::export_apis::router());

    Ok(Router::new()
        .route("/health", get(io::rest::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}
