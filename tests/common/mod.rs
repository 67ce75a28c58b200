#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;

use fitlog::config::LlmConfig;
use fitlog::db::{create_memory_pool, DbPool};
use fitlog::llm::{LlmClient, ProviderKind};
use fitlog::migrations::run_migrations_for_tests;
use fitlog::models::{CreateUser, User, WorkoutCategory, WorkoutWithExercises};
use fitlog::repositories::{SessionRepository, UserRepository};
use fitlog::routes::{create_router, AppStates};
use fitlog::storage::Storage;

pub const BASE_URL: &str = "http://fitlog.test";

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub struct TestApp {
    pub router: Router,
    pub storage: Storage,
    // Keeps the storage root alive for the test's duration.
    pub storage_dir: TempDir,
}

/// LLM settings with every provider keyed and pointed at `api_base`.
pub fn llm_config(api_base: &str) -> LlmConfig {
    LlmConfig {
        gemini_api_key: Some("gemini-key".to_string()),
        openai_api_key: Some("openai-key".to_string()),
        aiml_api_key: None,
        gemini_api_base: Some(api_base.to_string()),
        openai_api_base: Some(api_base.to_string()),
        aiml_api_base: Some(api_base.to_string()),
        text_provider: ProviderKind::Gemini,
        pdf_provider: ProviderKind::OpenAi,
    }
}

pub fn create_test_app(pool: DbPool) -> Router {
    create_test_app_with_llm(pool, llm_config("http://127.0.0.1:9")).router
}

pub fn create_test_app_with_llm(pool: DbPool, llm: LlmConfig) -> TestApp {
    let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");
    let storage = Storage::new(storage_dir.path(), BASE_URL);
    let llm = LlmClient::new(llm).expect("Failed to build LLM client");

    let states = AppStates::new(pool, storage.clone(), llm, BASE_URL);
    TestApp {
        router: create_router(states),
        storage,
        storage_dir,
    }
}

pub async fn create_test_user(pool: &DbPool, username: &str, password: &str) -> User {
    let user_repo = UserRepository::new(pool.clone());
    user_repo
        .create(&CreateUser {
            username: username.to_string(),
            password: password.to_string(),
            display_name: None,
        })
        .await
        .unwrap()
}

pub async fn create_session_cookie(pool: &DbPool, user: &User) -> String {
    let session_repo = SessionRepository::new(pool.clone());
    let token = session_repo.create(&user.id).await.unwrap();
    format!("session={}", token)
}

/// A fresh user plus a `Cookie` header value logged in as them.
pub async fn login(pool: &DbPool, username: &str) -> (User, String) {
    let user = create_test_user(pool, username, "password123").await;
    let cookie = create_session_cookie(pool, &user).await;
    (user, cookie)
}

pub fn extract_cookie_header(set_cookie: &str) -> String {
    // Extract just the cookie name=value part for use in Cookie header
    set_cookie.split(';').next().unwrap_or("").to_string()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).to_string()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Test data creation helpers
pub async fn create_test_workout(
    pool: &DbPool,
    user_id: &str,
    date: NaiveDate,
    category: WorkoutCategory,
    exercises: Value,
) -> WorkoutWithExercises {
    let exercises = serde_json::from_value(exercises).unwrap();
    let workout_repo = fitlog::repositories::WorkoutRepository::new(pool.clone());
    workout_repo
        .create_with_exercises(
            user_id,
            fitlog::models::NewWorkoutSession {
                date,
                category,
                duration_minutes: Some(60),
                notes: None,
                workout_plan_id: None,
            },
            exercises,
        )
        .await
        .unwrap()
}

pub fn count_workouts(pool: &DbPool, user_id: &str) -> i64 {
    let conn = pool.get().unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM workout_sessions WHERE user_id = ?",
        [user_id],
        |row| row.get(0),
    )
    .unwrap()
}
