use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::authenticator::SessionAuthenticator;
use crate::oauth::{AuthClient, OAuthConfig};

async fn provider(token_status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(token_status)
                .set_body_json(serde_json::json!({"access_token": "T"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"email": "a@b.com", "name": "A B"})),
        )
        .mount(&server)
        .await;
    server
}

fn app(server: &MockServer) -> Router {
    let oauth = OAuthConfig::new(
        "test-client",
        "test-secret",
        "http://localhost:8080/auth/callback".parse().unwrap(),
    )
    .with_token_url(format!("{}/token", server.uri()).parse().unwrap())
    .with_userinfo_url(format!("{}/userinfo", server.uri()).parse().unwrap());
    let config = WebAuthConfig::new(SessionAuthenticator::new(AuthClient::new(oauth)))
        .with_secure_cookies(false);
    let auth = AuthState::new(config, MemorySessionStore::new());

    Router::new()
        .merge(auth_routes(auth.clone()))
        .merge(resume_routes(auth, MemoryResumeStore::new()))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("__careerdoc_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect has a location")
        .to_owned()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn state_param(url: &str) -> String {
    Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

/// Walk login → callback and return the authenticated session cookie.
async fn sign_in(app: &Router) -> String {
    let response = send(app, "GET", "/auth/login", None, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response).expect("new visitor gets a session cookie");
    let state = state_param(&location(&response));

    let uri = format!("/auth/callback?code=C&state={state}");
    let response = send(app, "GET", &uri, Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    session_cookie(&response).expect("sign-in rotates the session cookie")
}

#[tokio::test]
async fn fresh_visitor_gets_login_url() {
    let server = provider(200).await;
    let app = app(&server);

    let response = send(&app, "GET", "/auth/session", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_some());
    let body = json_body(response).await;
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["phase"], "awaiting_redirect");
    let login_url = body["login_url"].as_str().unwrap();
    assert!(login_url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
    assert!(body.get("identity").is_none());
}

#[tokio::test]
async fn login_redirects_to_provider() {
    let server = provider(200).await;
    let app = app(&server);

    let response = send(&app, "GET", "/auth/login", None, None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = Url::parse(&location(&response)).unwrap();
    assert_eq!(target.host_str(), Some("accounts.google.com"));
    assert!(target.query_pairs().any(|(k, v)| k == "response_type" && v == "code"));
}

#[tokio::test]
async fn callback_authenticates_session() {
    let server = provider(200).await;
    let app = app(&server);

    let cookie = sign_in(&app).await;
    let response = send(&app, "GET", "/auth/session", Some(&cookie), None).await;

    let body = json_body(response).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["identity"]["email"], "a@b.com");
    assert!(body.get("login_url").is_none());
}

#[tokio::test]
async fn callback_state_mismatch_redirects_with_error() {
    let server = provider(200).await;
    let app = app(&server);

    let response = send(&app, "GET", "/auth/login", None, None).await;
    let cookie = session_cookie(&response).unwrap();

    let response = send(
        &app,
        "GET",
        "/auth/callback?code=C&state=forged",
        Some(&cookie),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?error=state_mismatch");

    let response = send(&app, "GET", "/auth/session", Some(&cookie), None).await;
    assert_eq!(json_body(response).await["authenticated"], false);
}

#[tokio::test]
async fn callback_token_failure_redirects_with_error() {
    let server = provider(400).await;
    let app = app(&server);

    let response = send(&app, "GET", "/auth/login", None, None).await;
    let cookie = session_cookie(&response).unwrap();
    let state = state_param(&location(&response));

    let uri = format!("/auth/callback?code=C&state={state}");
    let response = send(&app, "GET", &uri, Some(&cookie), None).await;

    assert_eq!(location(&response), "/login?error=token_exchange_failed");
}

#[tokio::test]
async fn callback_provider_denial() {
    let server = provider(200).await;
    let app = app(&server);

    let response = send(&app, "GET", "/auth/callback?error=access_denied", None, None).await;

    assert_eq!(location(&response), "/login?error=access_denied");
}

#[tokio::test]
async fn callback_without_code_is_rejected() {
    let server = provider(200).await;
    let app = app(&server);

    let response = send(&app, "GET", "/auth/callback", None, None).await;

    assert_eq!(location(&response), "/login?error=missing_code");
}

#[tokio::test]
async fn logout_resets_session() {
    let server = provider(200).await;
    let app = app(&server);
    let cookie = sign_in(&app).await;

    let response = send(&app, "POST", "/auth/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = send(&app, "GET", "/auth/session", Some(&cookie), None).await;
    let body = json_body(response).await;
    assert_eq!(body["authenticated"], false);
    assert!(body["login_url"].is_string());
}

#[tokio::test]
async fn logout_rejects_get() {
    let server = provider(200).await;
    let app = app(&server);
    let cookie = sign_in(&app).await;

    let response = send(&app, "GET", "/auth/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = send(&app, "GET", "/auth/session", Some(&cookie), None).await;
    assert_eq!(json_body(response).await["authenticated"], true);
}

#[tokio::test]
async fn resume_requires_authentication() {
    let server = provider(200).await;
    let app = app(&server);

    let response = send(
        &app,
        "PUT",
        "/resume",
        None,
        Some(serde_json::json!({"skills": ["Rust"]})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resume_save_and_read_back() {
    let server = provider(200).await;
    let app = app(&server);
    let cookie = sign_in(&app).await;

    let response = send(&app, "GET", "/resume", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let document = serde_json::json!({
        "personal_info": {"name": "Kim", "email": "a@b.com"},
        "skills": ["Rust", "SQL"],
        "education": [{"school_name": "KAIST", "degree": "BS"}]
    });
    let response = send(&app, "PUT", "/resume", Some(&cookie), Some(document)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let saved = json_body(response).await;
    assert_eq!(saved["owner_email"], "a@b.com");
    assert_eq!(saved["parse_status"], "success");

    let response = send(&app, "GET", "/resume", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["resume_data"]["skills"], serde_json::json!(["Rust", "SQL"]));
    assert_eq!(body["resume_data"]["education"][0]["school_name"], "KAIST");
}
