//! # jl-api
//!
//! The web routing and orchestration layer for the joke labeler.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Configures the labeling routes.
///
/// # Developer Note
/// The binary wraps the app in [`middleware::visitor_session`]; every route
/// here expects a `CurrentVisitor` to be resolved already.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/get_joke", web::get().to(handlers::get_joke))
        .route("/submit_label", web::post().to(handlers::submit_label));
}

// Malformed bodies get the same `{"error": ...}` shape as validation failures.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({ "error": message })),
        )
        .into()
    })
}
