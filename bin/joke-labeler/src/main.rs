//! # Joke Labeler Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_files::Files;
use actix_web::middleware::from_fn;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use jl_api::handlers::AppState;
use jl_api::middleware::{cors_policy, standard_middleware, visitor_session, SessionCookie};
use jl_config::Settings;
use jl_core::{AssignmentEngine, LabelingEngine, VisitorSessions};
use secrecy::ExposeSecret;

// Feature-gated imports
#[cfg(feature = "db-sqlite")]
use jl_db_sqlite::SqliteStore;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("enable a storage backend feature (db-sqlite)");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&settings.log_level));

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(
        SqliteStore::with_max_connections(&settings.database.url, settings.database.max_connections)
            .await
            .context("failed to init SQLite")?,
    );

    // 2. Session cookie signing
    let session = SessionCookie::from_secret(
        settings.session.secret_key.expose_secret().as_bytes(),
        settings.session.cookie_name.clone(),
        settings.session.secure_cookie,
    )
    .context("session.secret_key is too short")?;

    // 3. Wrap in AppState (Using dynamic dispatch behind the engines)
    let state = web::Data::new(AppState {
        assignments: AssignmentEngine::new(store.clone(), settings.selection.tie_break),
        labeling: LabelingEngine::new(store.clone(), store.clone()),
        visitors: VisitorSessions::new(store),
        session,
    });

    let static_dir = settings.server.static_dir.clone();
    let (host, port) = settings.bind_address();
    log::info!("Joke labeler starting on http://{host}:{port}");

    HttpServer::new(move || {
        let app = App::new()
            .app_data(state.clone())
            .wrap(from_fn(visitor_session))
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .configure(jl_api::configure_routes);

        // Static front end is mounted last so API routes win.
        match &static_dir {
            Some(dir) => app.service(Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
