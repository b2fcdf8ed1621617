use super::auth::require_basic_auth;
use super::handlers::{
    handle_get_data, handle_health, handle_legacy_save, handle_not_found, handle_raw_data,
    handle_root, handle_save, handle_stats,
};
use super::state::AppState;
use super::types::ErrorResponse;
use crate::config::CorsOrigins;

use axum::Json;
use axum::extract::DefaultBodyLimit;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Router, middleware};
use std::any::Any;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeader;
use tower_http::trace::TraceLayer;

const STATIC_CACHE_PRODUCTION: &str = "public, max-age=86400";
const STATIC_CACHE_DEVELOPMENT: &str = "no-cache";

/// Builds the full application: routes, static assets, and middleware stack.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let expose_errors = !config.is_production();

    // Unknown paths fall through ServeDir to the JSON 404; known paths hit with
    // the wrong method get the same 404 through each route's method fallback.
    let cache_control = HeaderValue::from_static(if config.is_production() {
        STATIC_CACHE_PRODUCTION
    } else {
        STATIC_CACHE_DEVELOPMENT
    });
    let static_assets = SetResponseHeader::if_not_present(
        ServeDir::new(&config.static_dir)
            .call_fallback_on_method_not_allowed(true)
            .fallback(handle_not_found.into_service()),
        header::CACHE_CONTROL,
        cache_control,
    );

    Router::new()
        .route("/", get(handle_root).fallback(handle_not_found))
        .route("/health", get(handle_health).fallback(handle_not_found))
        .route("/api/data", get(handle_get_data).fallback(handle_not_found))
        .route("/data.json", get(handle_raw_data).fallback(handle_not_found))
        .route("/api/save", post(handle_save).fallback(handle_not_found))
        .route("/save", post(handle_legacy_save).fallback(handle_not_found))
        .route("/api/stats", get(handle_stats).fallback(handle_not_found))
        .fallback_service(static_assets)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic, expose_errors)
        }))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(Duration::from_secs(600));

    match origins {
        CorsOrigins::Any => base.allow_origin(AnyOrigin),
        CorsOrigins::Mirror => base
            .allow_origin(AllowOrigin::mirror_request())
            .allow_credentials(true),
        CorsOrigins::List(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::error!("Ignoring invalid CORS origin '{}'", origin);
                        None
                    }
                })
                .collect();
            tracing::info!("CORS restricted to {:?}", list);
            base.allow_origin(AllowOrigin::list(allowed))
                .allow_credentials(true)
        }
    }
}

pub(crate) fn panic_response(panic: Box<dyn Any + Send + 'static>, expose_errors: bool) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Server error: {}", detail);

    let message = if expose_errors {
        detail
    } else {
        "Something went wrong".to_string()
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal Server Error".to_string(),
            message: Some(message),
        }),
    )
        .into_response()
}
