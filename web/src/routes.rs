//! Router configuration.

use crate::handlers::{self, exams, members, reservations};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Health checks and exam reads are public; `/members/*`, `/reservations/*`
/// need a bearer token; `/admin/*` needs an ADMIN bearer token.
pub fn build_router(state: AppState) -> Router {
    let member_routes = Router::new()
        .route("/", post(members::register).put(members::update))
        .route("/login", post(members::login))
        .route("/me", get(members::me))
        .route("/:id", axum::routing::delete(members::delete));

    let exam_routes = Router::new()
        .route("/", get(exams::list))
        .route("/:id", get(exams::get));

    let reservation_routes = Router::new()
        .route(
            "/",
            post(reservations::create)
                .get(reservations::list_mine)
                .put(reservations::update),
        )
        .route(
            "/:id",
            get(reservations::get).delete(reservations::delete),
        )
        .route("/:id/history", get(reservations::history));

    let admin_routes = Router::new()
        .route("/exams", post(exams::create).get(exams::admin_list))
        .route("/exams/:id", get(exams::admin_get).delete(exams::delete))
        .route("/reservations", put(reservations::admin_update))
        .route("/reservations/status", put(reservations::update_status))
        .route(
            "/reservations/member/:member_id",
            get(reservations::list_for_member),
        )
        .route(
            "/reservations/:id",
            axum::routing::delete(reservations::admin_delete),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .nest("/members", member_routes)
        .nest("/exams", exam_routes)
        .nest("/reservations", reservation_routes)
        .nest("/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
