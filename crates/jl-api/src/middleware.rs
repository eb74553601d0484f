//! joke-labeler/crates/jl-api/src/middleware.rs Middleware
//!
//! Access logging, CORS, and the visitor session that gives every client a
//! stable anonymous identity before any route runs.

use std::future::{ready, Ready};

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, CookieJar, Key, SameSite};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::error::ErrorInternalServerError;
use actix_web::middleware::{Logger, Next};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use jl_config::MIN_SECRET_LEN;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::AppState;

// Returns a standard access logger for the API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing)
// Important if the annotation front end is ever served from another origin.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allow_any_header()
        .max_age(3600)
}

/// How the visitor id travels between requests: a signed cookie.
#[derive(Clone)]
pub struct SessionCookie {
    key: Key,
    name: String,
    secure: bool,
}

impl SessionCookie {
    /// `None` when the secret is shorter than [`MIN_SECRET_LEN`].
    pub fn from_secret(secret: &[u8], name: impl Into<String>, secure: bool) -> Option<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return None;
        }
        Some(Self {
            key: Key::derive_from(secret),
            name: name.into(),
            secure,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The visitor id carried by a correctly signed cookie, if any.
    pub fn read(&self, presented: Option<Cookie<'static>>) -> Option<Uuid> {
        let mut jar = CookieJar::new();
        jar.add_original(presented?);
        let verified = jar.signed(&self.key).get(&self.name)?;
        Uuid::parse_str(verified.value()).ok()
    }

    pub fn issue(&self, visitor_id: Uuid) -> Option<Cookie<'static>> {
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(
            Cookie::build(self.name.clone(), visitor_id.to_string())
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(self.secure)
                .finish(),
        );
        jar.get(&self.name).cloned()
    }
}

/// The visitor making the current request. Populated by [`visitor_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentVisitor(pub Uuid);

impl CurrentVisitor {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl FromRequest for CurrentVisitor {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentVisitor>()
                .copied()
                .ok_or_else(|| ErrorInternalServerError("visitor session is not installed")),
        )
    }
}

/// Resolves the visitor from the session cookie, creating one on first
/// contact, and re-issues the cookie whenever the identity changed.
pub async fn visitor_session(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| ErrorInternalServerError("application state missing"))?;

    let presented = state.session.read(req.cookie(state.session.name()));
    let visitor = state
        .visitors
        .ensure_visitor(presented)
        .await
        .map_err(ApiError::from)?;
    req.extensions_mut().insert(CurrentVisitor(visitor.id));

    let mut res = next.call(req).await?;
    if presented != Some(visitor.id) {
        if let Some(cookie) = state.session.issue(visitor.id) {
            res.response_mut()
                .add_cookie(&cookie)
                .map_err(ErrorInternalServerError)?;
        }
    }
    Ok(res)
}
