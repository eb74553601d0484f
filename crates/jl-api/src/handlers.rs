//! # jl-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core engines.

use actix_web::{web, HttpResponse};
use jl_core::{AssignmentEngine, JokeId, LabelingEngine, SubmitLabelRequest, VisitorSessions};
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::{CurrentVisitor, SessionCookie};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub assignments: AssignmentEngine,
    pub labeling: LabelingEngine,
    pub visitors: VisitorSessions,
    pub session: SessionCookie,
}

#[derive(Debug, Serialize)]
struct JokePayload<'a> {
    id: JokeId,
    text: &'a str,
}

/// Serves the least-labeled joke the visitor has not labeled yet.
pub async fn get_joke(
    data: web::Data<AppState>,
    visitor: CurrentVisitor,
) -> Result<HttpResponse, ApiError> {
    match data.assignments.next_joke(visitor.id()).await? {
        Some(joke) => Ok(HttpResponse::Ok().json(JokePayload {
            id: joke.id,
            text: &joke.text,
        })),
        None => Ok(HttpResponse::NotFound().json(json!({ "message": "No more jokes to label" }))),
    }
}

/// Records punchline spans, or a "no punchline" marker, for one joke.
pub async fn submit_label(
    data: web::Data<AppState>,
    visitor: CurrentVisitor,
    body: web::Json<SubmitLabelRequest>,
) -> Result<HttpResponse, ApiError> {
    data.labeling
        .submit_label(visitor.id(), body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Label submitted successfully" })))
}
