mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_login_page_available() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app.oneshot(common::get("/auth/login", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Log in"));
}

#[tokio::test]
async fn test_dashboard_requires_auth() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app.oneshot(common::get("/", None)).await.unwrap();

    // Should redirect to login
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/auth/login");
}

#[tokio::test]
async fn test_api_requires_auth_with_json_401() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool);

    let response = app
        .oneshot(common::get("/api/workouts", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_register_logs_in() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());

    let response = app
        .oneshot(form_post(
            "/auth/register",
            "username=alice&password=password123&display_name=Alice",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.contains("session="));
    assert!(cookie.contains("HttpOnly"));

    let user_repo = fitlog::repositories::UserRepository::new(pool);
    let user = user_repo.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_register_duplicate_username_shows_error() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    common::create_test_user(&pool, "alice", "password123").await;

    let response = app
        .oneshot(form_post(
            "/auth/register",
            "username=alice&password=password123&display_name=",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert!(body.contains("Username is already taken"));
}

#[tokio::test]
async fn test_login_valid_credentials() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    common::create_test_user(&pool, "testuser", "password123").await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/auth/login",
            "username=testuser&password=password123",
        ))
        .await
        .unwrap();

    // Should redirect to dashboard on success
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    let cookie = common::extract_cookie_header(set_cookie);

    // The cookie opens the dashboard
    let response = app.oneshot(common::get("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    common::create_test_user(&pool, "testuser", "password123").await;

    let response = app
        .oneshot(form_post(
            "/auth/login",
            "username=testuser&password=wrongpassword",
        ))
        .await
        .unwrap();

    // Should return OK with error message (not redirect)
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = common::body_string(response).await;
    assert!(body.contains("Invalid username or password"));
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (_user, cookie) = common::login(&pool, "testuser").await;

    let response = app
        .clone()
        .oneshot(common::empty_request("POST", "/auth/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/auth/login");

    let response = app
        .oneshot(common::get("/api/workouts", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_token_authenticates_api() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (_user, cookie) = common::login(&pool, "testuser").await;
    let token = cookie.trim_start_matches("session=");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/workouts/today")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logged_in_user_skips_login_page() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (_user, cookie) = common::login(&pool, "testuser").await;

    let response = app
        .oneshot(common::get("/auth/login", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get("location").unwrap(), "/");
}
