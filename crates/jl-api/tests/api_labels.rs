use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::middleware::from_fn;
use actix_web::{test, web, App};
use jl_api::handlers::AppState;
use jl_api::middleware::{visitor_session, SessionCookie};
use jl_core::{
    AssignmentEngine, JokeRepo, LabelRepo, LabelingEngine, TieBreak, VisitorRepo,
    VisitorSessions,
};
use jl_db_sqlite::SqliteStore;
use serde_json::{json, Value};

async fn setup(jokes: &[&str]) -> (SqliteStore, web::Data<AppState>) {
    let store = SqliteStore::new("sqlite::memory:").await.unwrap();
    for text in jokes {
        store.insert_joke(text).await.unwrap();
    }

    let shared = Arc::new(store.clone());
    let state = web::Data::new(AppState {
        assignments: AssignmentEngine::new(shared.clone(), TieBreak::LowestId),
        labeling: LabelingEngine::new(shared.clone(), shared.clone()),
        visitors: VisitorSessions::new(shared),
        session: SessionCookie::from_secret(&[42u8; 32], "visitor_id", false).unwrap(),
    });
    (store, state)
}

fn visitor_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "visitor_id")
        .map(|c| c.into_owned())
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(from_fn(visitor_session))
                .configure(jl_api::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn first_contact_issues_a_visitor_cookie_and_reuses_it() {
    let (store, state) = setup(&["one"]).await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/get_joke").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = visitor_cookie(&resp).expect("visitor cookie");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["text"], "one");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/get_joke").cookie(cookie.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(visitor_cookie(&resp).is_none(), "known visitor keeps its cookie");

    let visitor = state.session.read(Some(cookie)).unwrap();
    assert!(store.get_visitor(visitor).await.unwrap().is_some());
}

#[actix_web::test]
async fn forged_cookie_gets_a_fresh_identity() {
    let (_store, state) = setup(&["one"]).await;
    let app = app!(state);

    let forged = Cookie::new("visitor_id", uuid_like());
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/get_joke").cookie(forged).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(visitor_cookie(&resp).is_some());
}

fn uuid_like() -> String {
    "00000000-0000-4000-8000-000000000000".to_string()
}

#[actix_web::test]
async fn labeling_moves_the_visitor_on_and_exhausts_the_corpus() {
    let (store, state) = setup(&["first", "second"]).await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/get_joke").to_request()).await;
    let cookie = visitor_cookie(&resp).unwrap();
    let joke: Value = test::read_body_json(resp).await;
    let first_id = joke["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/submit_label")
            .cookie(cookie.clone())
            .set_json(json!({
                "joke_id": first_id,
                "segments": [{"start": 0, "end": 5}, {"start": 10, "end": null}],
                "no_punchline": false
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Label submitted successfully");

    let labels = store.labels_for_joke(first_id).await.unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].segments.len(), 1);
    assert_eq!(labels[0].segments[0].start_index, 0);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/get_joke").cookie(cookie.clone()).to_request(),
    )
    .await;
    let joke: Value = test::read_body_json(resp).await;
    assert_eq!(joke["text"], "second");
    let second_id = joke["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/submit_label")
            .cookie(cookie.clone())
            .set_json(json!({ "joke_id": second_id, "segments": [], "no_punchline": true }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let labels = store.labels_for_joke(second_id).await.unwrap();
    assert!(labels[0].no_punchline);
    assert!(labels[0].segments.is_empty());

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/get_joke").cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "No more jokes to label");
}

#[actix_web::test]
async fn invalid_submissions_are_rejected_without_writes() {
    let (store, state) = setup(&["only"]).await;
    let app = app!(state);

    let cases = [
        (json!({ "segments": [{"start": 0, "end": 1}] }), "missing joke id"),
        (
            json!({ "joke_id": 1, "segments": [], "no_punchline": false }),
            "must provide segments or mark no punchline",
        ),
        (json!({ "joke_id": 999, "no_punchline": true }), "unknown joke id 999"),
    ];

    for (payload, expected) in cases {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/submit_label")
                .set_json(payload)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], expected);
    }

    assert!(store.labels_for_joke(1).await.unwrap().is_empty());
}

#[actix_web::test]
async fn malformed_json_is_a_client_error() {
    let (_store, state) = setup(&[]).await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/submit_label")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"joke_id\": \"seven\"")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn empty_corpus_reports_nothing_left() {
    let (_store, state) = setup(&[]).await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/get_joke").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
