//! Read-only JSON API over a published [`Snapshot`].
//!
//! The router serves one snapshot; it never refreshes. Rebuild the router
//! with the new `Arc<Snapshot>` to serve a later refresh.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", covid_api::api_router(snapshot))
//! ```

pub mod districts;
pub mod error;
pub mod maps;
pub mod national;
pub mod regions;
pub mod states;

use std::sync::Arc;

use axum::{Router, routing::get};
use covid_source::Snapshot;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build the API router for `snapshot`.
pub fn api_router(snapshot: Arc<Snapshot>) -> Router<()> {
  Router::new()
    .route("/regions", get(regions::list))
    // National
    .route("/national", get(national::series))
    .route("/tested", get(national::tested))
    // States
    .route("/states", get(states::frame))
    .route("/states/active", get(states::active))
    .route("/states/{code}", get(states::one))
    .route("/states/{code}/totals", get(states::totals))
    // Districts
    .route("/districts/{code}", get(districts::latest))
    .route("/districts/{code}/{district}", get(districts::series))
    // Maps
    .route("/map", get(maps::national))
    .route("/map/{code}", get(maps::districts))
    .layer(TraceLayer::new_for_http())
    .with_state(snapshot)
}
