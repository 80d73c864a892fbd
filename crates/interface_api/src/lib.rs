//! HTTP API Layer
//!
//! This crate provides the REST API for the hospital billing and settlement
//! subsystem using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers per domain (pharmacy, admissions, billing)
//! - **DTOs**: request/response data transfer objects
//! - **Error Handling**: consistent error responses mapped from the domain's
//!   error classification (validation 422, conflict 409, not-found 404,
//!   transient 503)
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(store, ChargePolicy::default(), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_billing::{BillingStore, ChargePolicy, DischargeService, DispensingService, PaymentService};

use crate::config::ApiConfig;
use crate::handlers::{admissions, billing, health, pharmacy};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BillingStore>,
    pub dispensing: Arc<DispensingService>,
    pub discharge: Arc<DischargeService>,
    pub payments: Arc<PaymentService>,
    pub policy: ChargePolicy,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `store` - Billing store adapter (PostgreSQL in production)
/// * `policy` - Charge tariff policy
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(
    store: Arc<dyn BillingStore>,
    policy: ChargePolicy,
    config: ApiConfig,
) -> Router {
    let state = AppState {
        dispensing: Arc::new(DispensingService::new(store.clone(), policy.clone())),
        discharge: Arc::new(DischargeService::new(store.clone(), policy.clone())),
        payments: Arc::new(PaymentService::new(store.clone(), policy.clone())),
        store,
        policy,
        config,
    };

    // Public routes (no versioned prefix)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Pharmacy routes
    let pharmacy_routes = Router::new().route("/dispense", post(pharmacy::dispense));

    // Admissions routes
    let admissions_routes =
        Router::new().route("/stays/:id/discharge", post(admissions::discharge));

    // Billing routes
    let billing_routes = Router::new()
        .route("/consultations", post(billing::bill_consultation))
        .route("/invoices/:id", get(billing::get_invoice))
        .route("/invoices/:id/settle", post(billing::settle_invoice))
        .route("/invoices/:id/confirm", post(billing::confirm_invoice))
        .route("/invoices/:id/status", get(billing::invoice_status))
        .route(
            "/patients/:id/invoices",
            get(billing::list_patient_invoices),
        );

    let api_routes = Router::new()
        .nest("/pharmacy", pharmacy_routes)
        .nest("/admissions", admissions_routes)
        .nest("/billing", billing_routes);

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
