//! End-to-end tests against the full router, backed by the in-memory store
//! and the stock test-user directory.

use super::routes;
use crate::bus::EventBus;
use crate::state::AppState;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use axum_helpers::{JwtAuth, JwtConfig};
use ims_attachments::{AttachmentStore, LocalStore, NoStore};
use ims_directory::TestUsersDirectory;
use ims_store::{ActionLogWriter, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

async fn test_state() -> AppState {
    test_state_with_attachments(Arc::new(NoStore)).await
}

async fn test_state_with_attachments(attachments: Arc<dyn AttachmentStore>) -> AppState {
    let store = Store::connect_fake().await.unwrap();
    AppState {
        store: store.clone(),
        directory: Arc::new(TestUsersDirectory::with_default_users().unwrap()),
        jwt: JwtAuth::new(&JwtConfig::new(SECRET)),
        bus: EventBus::new(),
        action_log: ActionLogWriter::synchronous(store),
        attachments,
        attachments_bucket: "attachments".to_string(),
        admins: Arc::new(vec!["Hardware".to_string()]),
        cache_control_short: 20,
        cache_control_long: 1200,
        max_request_bytes: 102_400,
    }
}

/// Access token for one of the stock test users.
fn token_for(state: &AppState, handle: &str) -> String {
    let (sub, on_site, positions, teams) = match handle {
        "Hardware" => ("1", true, vec!["Operator".to_string()], vec![]),
        "Tulsa" => ("2", true, vec!["Dirt".to_string()], vec![]),
        "Moonbeam" => ("3", false, vec![], vec!["Green Dot".to_string()]),
        other => panic!("unknown test user: {}", other),
    };
    state
        .jwt
        .issue_access_token(sub, handle, on_site, positions, teams)
        .unwrap()
        .0
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create an event as the admin and install its access rules.
async fn setup_event(app: &Router, admin: &str, name: &str, rules: Value) {
    let response = send(app, post_json("/ims/api/events", Some(admin), json!({ "name": name }))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(app, post_json("/ims/api/access", Some(admin), json!({ name: rules }))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

fn rule(expression: &str) -> Value {
    json!([{ "expression": expression, "validity": "always" }])
}

#[tokio::test]
async fn ping_acknowledges() {
    let state = test_state().await;
    let app = routes(&state);
    let response = send(&app, get("/ims/api/ping", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ack");
}

#[tokio::test]
async fn login_returns_token_and_refresh_cookie() {
    let state = test_state().await;
    let app = routes(&state);

    let response = send(
        &app,
        post_json(
            "/ims/api/auth",
            None,
            json!({ "identification": "Tulsa", "password": "Tulsa" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("refresh_token="));

    let body = json_body(response).await;
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert!(body["expires_unix_ms"].as_i64().unwrap() > 0);

    // The returned token works on a protected route.
    let response = send(&app, get("/ims/api/events", Some(token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_by_email_works_and_bad_credentials_do_not() {
    let state = test_state().await;
    let app = routes(&state);

    let response = send(
        &app,
        post_json(
            "/ims/api/auth",
            None,
            json!({ "identification": "tulsa@example.org", "password": "Tulsa" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    for (identification, password) in [("Tulsa", "wrong"), ("Nobody", "Nobody")] {
        let response = send(
            &app,
            post_json(
                "/ims/api/auth",
                None,
                json!({ "identification": identification, "password": password }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn refresh_mints_a_new_access_token() {
    let state = test_state().await;
    let app = routes(&state);

    let response = send(
        &app,
        post_json(
            "/ims/api/auth",
            None,
            json!({ "identification": "Tulsa", "password": "Tulsa" }),
        ),
    )
    .await;
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/ims/api/auth/refresh")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(!body["token"].as_str().unwrap().is_empty());

    // No cookie at all is unauthorized.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/ims/api/auth/refresh")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_authentication() {
    let state = test_state().await;
    let app = routes(&state);
    for uri in ["/ims/api/events", "/ims/api/personnel"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn auth_state_reports_user_admin_and_event_access() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(&app, &admin, "Burn2025", json!({ "read": rule("person:Tulsa") })).await;

    // Anonymous.
    let body = json_body(send(&app, get("/ims/api/auth", None)).await).await;
    assert_eq!(body["authenticated"], json!(false));
    assert!(body.get("user").is_none());

    // Regular user with read access on the event.
    let body = json_body(send(&app, get("/ims/api/auth?event_id=Burn2025", Some(&tulsa))).await).await;
    assert_eq!(body["authenticated"], json!(true));
    assert_eq!(body["user"], json!("Tulsa"));
    assert_eq!(body["admin"], json!(false));
    let names = body["event_access"]["Burn2025"].as_array().unwrap();
    assert!(names.contains(&json!("ReadIncidents")));
    assert!(!names.contains(&json!("WriteIncidents")));

    // Administrator.
    let body = json_body(send(&app, get("/ims/api/auth", Some(&admin))).await).await;
    assert_eq!(body["admin"], json!(true));
}

#[tokio::test]
async fn event_creation_validates_names_and_groups() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");

    let response = send(&app, post_json("/ims/api/events", Some(&admin), json!({ "name": "Burn2025" }))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let id = response.headers().get("IMS-Event-ID").unwrap().to_str().unwrap();
    assert_eq!(id, "1");

    // Non-admin cannot administrate events.
    let tulsa = token_for(&state, "Tulsa");
    let response = send(&app, post_json("/ims/api/events", Some(&tulsa), json!({ "name": "Other" }))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Malformed names and group invariants are all rejected.
    for body in [
        json!({ "name": "Burn 2025" }),
        json!({ "name": "" }),
        json!({ "name": "Self", "parent_group": "Self" }),
        json!({ "name": "Sub", "is_group": true, "parent_group": "Burn2025" }),
        json!({ "name": "Sub", "parent_group": "Nowhere" }),
        // Burn2025 exists but is not a group.
        json!({ "name": "Sub", "parent_group": "Burn2025" }),
    ] {
        let response = send(&app, post_json("/ims/api/events", Some(&admin), body.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
    }

    // A group can parent an event.
    let response = send(
        &app,
        post_json("/ims/api/events", Some(&admin), json!({ "name": "Burns", "is_group": true })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(
        &app,
        post_json("/ims/api/events", Some(&admin), json!({ "name": "Burn2026", "parent_group": "Burns" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn event_listing_is_scoped_to_readable_names() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(&app, &admin, "Burn2025", json!({ "read": rule("person:Tulsa") })).await;
    setup_event(&app, &admin, "Burn2024", json!({})).await;

    let body = json_body(send(&app, get("/ims/api/events", Some(&tulsa))).await).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Burn2025"]);

    // The admin sees everything.
    let body = json_body(send(&app, get("/ims/api/events", Some(&admin))).await).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn incident_create_and_diff_update() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(&app, &admin, "Burn2025", json!({ "write": rule("person:Tulsa") })).await;

    let (_, mut receiver) = state.bus.subscribe();

    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/incidents",
            Some(&tulsa),
            json!({ "summary": "Dust storm at 3:00 & C", "priority": 1 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get("IMS-Incident-Number").unwrap(),
        "1"
    );
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/ims/api/events/Burn2025/incidents/1"
    );

    let event = receiver.try_recv().unwrap();
    assert_eq!(event.kind, "Incident");
    assert_eq!(event.data["event_id"], json!("Burn2025"));
    assert_eq!(event.data["incident_number"], json!(1));

    // Creation records no change diff.
    let body = json_body(send(&app, get("/ims/api/events/Burn2025/incidents/1", Some(&tulsa))).await).await;
    assert_eq!(body["summary"], json!("Dust storm at 3:00 & C"));
    assert_eq!(body["priority"], json!(1));
    assert_eq!(body["report_entries"].as_array().unwrap().len(), 0);

    // A diff update appends exactly one generated entry naming the change.
    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/incidents/1",
            Some(&tulsa),
            json!({ "priority": 3 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let event = receiver.try_recv().unwrap();
    assert_eq!(event.kind, "Incident");

    let body = json_body(send(&app, get("/ims/api/events/Burn2025/incidents/1", Some(&tulsa))).await).await;
    let entries = body["report_entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["generated"], json!(true));
    assert_eq!(entries[0]["author"], json!("Tulsa"));
    assert!(entries[0]["text"].as_str().unwrap().contains("Changed priority: 3"));

    // An unchanged value produces no new entry and no event.
    send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/incidents/1",
            Some(&tulsa),
            json!({ "priority": 3 }),
        ),
    )
    .await;
    let body = json_body(send(&app, get("/ims/api/events/Burn2025/incidents/1", Some(&tulsa))).await).await;
    assert_eq!(body["report_entries"].as_array().unwrap().len(), 1);
    assert!(receiver.try_recv().is_err());

    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/incidents/1",
            Some(&tulsa),
            json!({ "priority": 2 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn authorization_matrix_escalates_with_grants() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let moonbeam = token_for(&state, "Moonbeam");
    setup_event(&app, &admin, "Burn2025", json!({})).await;

    // No grant: forbidden.
    let response = send(&app, get("/ims/api/events/Burn2025/incidents", Some(&moonbeam))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Reader: may read, not write.
    let response = send(
        &app,
        post_json("/ims/api/access", Some(&admin), json!({ "Burn2025": { "read": rule("team:Green Dot") } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(&app, get("/ims/api/events/Burn2025/incidents", Some(&moonbeam))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(
        &app,
        post_json("/ims/api/events/Burn2025/incidents", Some(&moonbeam), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Writer: may create.
    let response = send(
        &app,
        post_json(
            "/ims/api/access",
            Some(&admin),
            json!({ "Burn2025": { "write": rule("team:Green Dot") } }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(
        &app,
        post_json("/ims/api/events/Burn2025/incidents", Some(&moonbeam), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn onsite_rules_do_not_match_offsite_subjects() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let moonbeam = token_for(&state, "Moonbeam");
    setup_event(
        &app,
        &admin,
        "Burn2025",
        json!({ "read": [{ "expression": "person:Moonbeam", "validity": "onsite" }] }),
    )
    .await;

    // Moonbeam is off site.
    let response = send(&app, get("/ims/api/events/Burn2025/incidents", Some(&moonbeam))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn permission_is_checked_before_existence() {
    let state = test_state().await;
    let app = routes(&state);
    let tulsa = token_for(&state, "Tulsa");

    // The event does not exist; the caller still sees 403, not 404.
    let response = send(&app, get("/ims/api/events/Nowhere/incidents", Some(&tulsa))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn strike_toggles_and_null_is_a_noop() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(&app, &admin, "Burn2025", json!({ "write": rule("person:Tulsa") })).await;

    send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/incidents",
            Some(&tulsa),
            json!({ "report_entries": [{ "text": "wrong incident, ignore" }] }),
        ),
    )
    .await;
    let body = json_body(send(&app, get("/ims/api/events/Burn2025/incidents/1", Some(&tulsa))).await).await;
    let entry_id = body["report_entries"][0]["id"].as_i64().unwrap();

    let response = send(
        &app,
        post_json(
            &format!("/ims/api/events/Burn2025/incidents/1/report_entries/{}", entry_id),
            Some(&tulsa),
            json!({ "stricken": true }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = json_body(send(&app, get("/ims/api/events/Burn2025/incidents/1", Some(&tulsa))).await).await;
    let entries = body["report_entries"].as_array().unwrap();
    assert_eq!(entries[0]["stricken"], json!(true));
    let audit = entries.last().unwrap();
    assert_eq!(audit["generated"], json!(true));
    assert_eq!(
        audit["text"],
        json!(format!("Struck reportEntry {}", entry_id))
    );

    // Null leaves the flag and the journal alone.
    let before = entries.len();
    let response = send(
        &app,
        post_json(
            &format!("/ims/api/events/Burn2025/incidents/1/report_entries/{}", entry_id),
            Some(&tulsa),
            json!({ "stricken": null }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let body = json_body(send(&app, get("/ims/api/events/Burn2025/incidents/1", Some(&tulsa))).await).await;
    assert_eq!(body["report_entries"].as_array().unwrap().len(), before);

    // Unknown entry is 404.
    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/incidents/1/report_entries/9999",
            Some(&tulsa),
            json!({ "stricken": true }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn field_report_attach_and_detach() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(&app, &admin, "Burn2025", json!({ "write": rule("person:Tulsa") })).await;

    send(
        &app,
        post_json("/ims/api/events/Burn2025/incidents", Some(&tulsa), json!({})),
    )
    .await;
    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/field_reports",
            Some(&tulsa),
            json!({ "summary": "Lost bike", "report_entries": [{ "text": "found near 9:00 portal" }] }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get("IMS-Field-Report-Number").unwrap(),
        "1"
    );

    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/field_reports/1?action=attach&incident=1",
            Some(&tulsa),
            json!({}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = json_body(
        send(&app, get("/ims/api/events/Burn2025/field_reports/1", Some(&tulsa))).await,
    )
    .await;
    assert_eq!(body["incident_number"], json!(1));
    let texts: Vec<&str> = body["report_entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["text"].as_str().unwrap())
        .collect();
    assert!(texts.contains(&"Attached to incident: 1"));

    // The incident side lists the report.
    let body = json_body(send(&app, get("/ims/api/events/Burn2025/incidents/1", Some(&tulsa))).await).await;
    assert_eq!(body["field_reports"], json!([1]));

    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/field_reports/1?action=detach",
            Some(&tulsa),
            json!({}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let body = json_body(
        send(&app, get("/ims/api/events/Burn2025/field_reports/1", Some(&tulsa))).await,
    )
    .await;
    assert_eq!(body["incident_number"], json!(null));

    // Attaching to a missing incident or with a bad action is rejected.
    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/field_reports/1?action=attach",
            Some(&tulsa),
            json!({}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/field_reports/1?action=merge&incident=1",
            Some(&tulsa),
            json!({}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn own_field_reports_are_scoped_to_their_author() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    let moonbeam = token_for(&state, "Moonbeam");
    setup_event(
        &app,
        &admin,
        "Burn2025",
        json!({ "report": [
            { "expression": "person:Tulsa", "validity": "always" },
            { "expression": "team:Green Dot", "validity": "always" },
        ] }),
    )
    .await;

    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/field_reports",
            Some(&tulsa),
            json!({ "report_entries": [{ "text": "mine" }] }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // The author sees their report; another reporter does not.
    let body = json_body(
        send(&app, get("/ims/api/events/Burn2025/field_reports", Some(&tulsa))).await,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let body = json_body(
        send(&app, get("/ims/api/events/Burn2025/field_reports", Some(&moonbeam))).await,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let response = send(
        &app,
        get("/ims/api/events/Burn2025/field_reports/1", Some(&moonbeam)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/field_reports/1",
            Some(&moonbeam),
            json!({ "summary": "hijack" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stay_lifecycle_uses_the_stay_grants() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(
        &app,
        &admin,
        "Burn2025",
        json!({
            "write": rule("person:Tulsa"),
            "write_stays": rule("person:Tulsa"),
        }),
    )
    .await;

    // Incident writer alone cannot touch stays.
    let moonbeam = token_for(&state, "Moonbeam");
    let response = send(&app, get("/ims/api/events/Burn2025/stays", Some(&moonbeam))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/stays",
            Some(&tulsa),
            json!({ "preferred_name": "Dusty", "arrival": { "method": "walk-in" } }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("IMS-Stay-Number").unwrap(), "1");

    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/stays/1",
            Some(&tulsa),
            json!({ "camp_info": "7:30 & E" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Stay reads ride on the read grant ("write" includes it via READER).
    let body = json_body(send(&app, get("/ims/api/events/Burn2025/stays/1", Some(&tulsa))).await).await;
    assert_eq!(body["preferred_name"], json!("Dusty"));
    assert_eq!(body["camp_info"], json!("7:30 & E"));
    assert_eq!(body["arrival"]["method"], json!("walk-in"));
    let last = body["report_entries"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["generated"], json!(true));
    assert!(last["text"].as_str().unwrap().contains("camp info"));
}

#[tokio::test]
async fn incident_types_vocabulary_management() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");

    let response = send(
        &app,
        post_json(
            "/ims/api/incident_types",
            Some(&admin),
            json!({ "add": ["Medical", "Fire"], "hide": ["Fire"] }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Any authenticated user may read the vocabulary.
    let response = send(&app, get("/ims/api/incident_types", Some(&tulsa))).await;
    assert!(response.headers().contains_key(header::CACHE_CONTROL));
    let body = json_body(response).await;
    assert_eq!(body, json!(["Medical"]));

    let body = json_body(send(&app, get("/ims/api/incident_types?hidden=true", Some(&tulsa))).await).await;
    assert_eq!(body, json!(["Fire", "Medical"]));

    // But not administrate it.
    let response = send(
        &app,
        post_json("/ims/api/incident_types", Some(&tulsa), json!({ "add": ["Theft"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Duplicates conflict.
    let response = send(
        &app,
        post_json("/ims/api/incident_types", Some(&admin), json!({ "add": ["Medical"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn streets_are_add_only() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(&app, &admin, "Burn2025", json!({})).await;

    let response = send(
        &app,
        post_json("/ims/api/streets", Some(&admin), json!({ "Burn2025": { "A": "Arno" } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Existing ids are never renamed; new ids are added.
    let response = send(
        &app,
        post_json(
            "/ims/api/streets",
            Some(&admin),
            json!({ "Burn2025": { "A": "Renamed", "B": "Botticelli" } }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = json_body(send(&app, get("/ims/api/streets?event_id=Burn2025", Some(&tulsa))).await).await;
    assert_eq!(body, json!({ "A": "Arno", "B": "Botticelli" }));

    let response = send(
        &app,
        post_json("/ims/api/streets", Some(&tulsa), json!({ "Burn2025": { "C": "Cosimo" } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn destinations_replace_per_type() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(&app, &admin, "Burn2025", json!({ "read": rule("person:Tulsa") })).await;

    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/destinations",
            Some(&admin),
            json!({
                "medical": [{ "name": "Rampart" }, { "name": "Station 3", "location_string": "3:00 & C" }],
                "sanctuary": [{ "name": "Big Top" }],
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Replacing one type leaves the other alone.
    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/destinations",
            Some(&admin),
            json!({ "medical": [{ "name": "Rampart" }] }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = json_body(
        send(&app, get("/ims/api/events/Burn2025/destinations", Some(&tulsa))).await,
    )
    .await;
    assert_eq!(body["medical"], json!([{ "name": "Rampart" }]));
    assert_eq!(body["sanctuary"].as_array().unwrap().len(), 1);

    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/destinations",
            Some(&tulsa),
            json!({ "medical": [] }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn personnel_listing_redacts_contact_and_secrets() {
    let state = test_state().await;
    let app = routes(&state);
    let tulsa = token_for(&state, "Tulsa");

    let response = send(&app, get("/ims/api/personnel", Some(&tulsa))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::CACHE_CONTROL));
    let body = json_body(response).await;
    let people = body.as_array().unwrap();
    assert_eq!(people.len(), 3);
    for person in people {
        assert!(person.get("email").is_none());
        assert!(person.get("password_hash").is_none());
        assert!(person["handle"].is_string());
        assert_eq!(person["status"], json!("active"));
    }
}

#[tokio::test]
async fn mutations_are_recorded_in_the_action_log() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");

    send(&app, post_json("/ims/api/events", Some(&admin), json!({ "name": "Burn2025" }))).await;
    // Reads are not recorded.
    send(&app, get("/ims/api/events", Some(&admin))).await;

    let body = json_body(send(&app, get("/ims/api/actionlogs", Some(&admin))).await).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["method"], json!("POST"));
    assert_eq!(rows[0]["path"], json!("/ims/api/events"));
    assert_eq!(rows[0]["user_name"], json!("Hardware"));
    assert_eq!(rows[0]["http_status"], json!(204));
    assert!(rows[0]["created"].as_str().unwrap().contains('T'));

    // Filters narrow the listing; non-admins cannot read it.
    let body = json_body(
        send(&app, get("/ims/api/actionlogs?user_name=Nobody", Some(&admin))).await,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 0);
    let response = send(&app, get("/ims/api/actionlogs", Some(&tulsa))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn eventsource_streams_without_a_token() {
    let state = test_state().await;
    let app = routes(&state);

    let response = send(&app, get("/ims/api/eventsource", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
}

#[tokio::test]
async fn attachment_upload_and_download_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state_with_attachments(Arc::new(LocalStore::new(dir.path()))).await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(&app, &admin, "Burn2025", json!({ "write": rule("person:Tulsa") })).await;
    send(&app, post_json("/ims/api/events/Burn2025/incidents", Some(&tulsa), json!({}))).await;

    let boundary = "ims-test-boundary";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"scene.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         jpeg bytes\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/ims/api/events/Burn2025/incidents/1/attachments")
        .header(header::AUTHORIZATION, format!("Bearer {}", tulsa))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("/ims/api/events/Burn2025/incidents/1/attachments/"));

    let response = send(&app, get(&location, Some(&tulsa))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"scene.jpg\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"jpeg bytes");

    // The journal gained a user entry carrying the file metadata.
    let body = json_body(send(&app, get("/ims/api/events/Burn2025/incidents/1", Some(&tulsa))).await).await;
    let entries = body["report_entries"].as_array().unwrap();
    let with_file = entries
        .iter()
        .find(|e| e.get("attached_file_name").is_some())
        .unwrap();
    assert_eq!(with_file["attached_file_name"], json!("scene.jpg"));
    assert_eq!(with_file["generated"], json!(false));

    // An entry on another incident is not reachable through this one.
    let response = send(
        &app,
        get("/ims/api/events/Burn2025/incidents/1/attachments/9999", Some(&tulsa)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploads_fail_cleanly_when_attachments_are_disabled() {
    let state = test_state().await;
    let app = routes(&state);
    let admin = token_for(&state, "Hardware");
    let tulsa = token_for(&state, "Tulsa");
    setup_event(&app, &admin, "Burn2025", json!({ "write": rule("person:Tulsa") })).await;
    send(&app, post_json("/ims/api/events/Burn2025/incidents", Some(&tulsa), json!({}))).await;

    let boundary = "ims-test-boundary";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"x.txt\"\r\n\r\n\
         hello\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/ims/api/events/Burn2025/incidents/1/attachments")
        .header(header::AUTHORIZATION, format!("Bearer {}", tulsa))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was journaled.
    let body = json_body(send(&app, get("/ims/api/events/Burn2025/incidents/1", Some(&tulsa))).await).await;
    assert_eq!(body["report_entries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let state = test_state().await;
    let app = routes(&state);
    let tulsa = token_for(&state, "Tulsa");

    let huge = "x".repeat(state.max_request_bytes + 1);
    let response = send(
        &app,
        post_json(
            "/ims/api/events/Burn2025/incidents",
            Some(&tulsa),
            json!({ "summary": huge }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
