pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me));

    let workshop_routes = Router::new()
        .route("/", post(routes::workshop::create))
        .route("/mine", get(routes::workshop::list_mine))
        .route("/{workshop_id}", get(routes::workshop::get))
        .route("/{workshop_id}", put(routes::workshop::update))
        .route("/{workshop_id}/publish", post(routes::workshop::publish))
        .route(
            "/{workshop_id}/open-registration",
            post(routes::workshop::open_registration),
        )
        .route(
            "/{workshop_id}/close-registration",
            post(routes::workshop::close_registration),
        )
        .route("/{workshop_id}/start", post(routes::workshop::start))
        .route("/{workshop_id}/cancel", post(routes::workshop::cancel))
        .route("/{workshop_id}/complete", post(routes::workshop::complete))
        .route("/{workshop_id}/enroll", post(routes::workshop::enroll))
        .route(
            "/{workshop_id}/enrollment",
            get(routes::workshop::my_enrollment),
        )
        .route(
            "/{workshop_id}/enrollments",
            get(routes::workshop::enrollments),
        )
        .route(
            "/{workshop_id}/leaderboard",
            get(routes::workshop::leaderboard),
        )
        .route("/{workshop_id}/team", get(routes::workshop::teams))
        .route("/{workshop_id}/session", get(routes::workshop::sessions))
        .route(
            "/{workshop_id}/session",
            post(routes::workshop::create_session),
        );

    let session_routes = Router::new()
        .route("/{session_id}/start", post(routes::session::start))
        .route("/{session_id}/end", post(routes::session::end))
        .route("/{session_id}/join", post(routes::session::join))
        .route(
            "/{session_id}/regenerate-code",
            post(routes::session::regenerate_code),
        )
        .route("/{session_id}/activity", get(routes::session::activities))
        .route(
            "/{session_id}/activity",
            post(routes::session::create_activity),
        );

    let activity_routes = Router::new()
        .route("/{activity_id}", get(routes::activity::get))
        .route("/{activity_id}/start", post(routes::activity::start))
        .route("/{activity_id}/submit", post(routes::activity::submit))
        .route("/{activity_id}/complete", post(routes::activity::complete));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/workshop", workshop_routes)
        .nest("/session", session_routes)
        .nest("/activity", activity_routes)
        .route("/join", post(routes::join::join_by_code));

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
