mod common;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fitlog::repositories::WorkoutRepository;
use mockito::Matcher;
use serde_json::json;
use tower::ServiceExt;

fn gemini_reply(text: &str) -> String {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
}

fn chat_reply(text: &str) -> String {
    json!({ "choices": [{ "message": { "content": text } }] }).to_string()
}

#[tokio::test]
async fn test_process_workout_text_creates_workout() {
    let mut server = mockito::Server::new_async().await;
    let reply = "Here you go:\n```json\n{\"workout_session\": {\"category\": \"push\", \"duration_minutes\": null, \"notes\": \"Felt strong\"}, \"exercises\": [{\"exercise_name\": \"Bench Press\", \"exercise_type\": \"strength\", \"sets\": \"3\", \"reps\": 10, \"weight_kg\": 80}, {\"exercise_name\": \"Push Ups\", \"sets\": 2, \"reps\": 20}]}\n```";
    let mock = server
        .mock("POST", "/models/gemini-1.5-flash-latest:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "gemini-key".into()))
        .with_status(200)
        .with_body(gemini_reply(reply))
        .create_async()
        .await;

    let pool = common::setup_test_db();
    let app = common::create_test_app_with_llm(pool.clone(), common::llm_config(&server.url()));
    let (user, cookie) = common::login(&pool, "lifter").await;

    let response = app
        .router
        .oneshot(common::json_request(
            "POST",
            "/api/ai/process-workout-text",
            Some(&cookie),
            json!({
                "workout_text": "Bench 3x10 at 80kg, then 2x20 push ups",
                "workout_date": "2024-03-04",
                "category": "auto"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["exercises_created"], 2);
    assert_eq!(body["message"], "Successfully created workout with 2 exercises");
    mock.assert_async().await;

    let repo = WorkoutRepository::new(pool.clone());
    let workout = repo
        .find_with_exercises(body["workout_session_id"].as_str().unwrap(), &user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(workout.session.duration_minutes, Some(60));
    assert_eq!(workout.session.notes.as_deref(), Some("Felt strong"));
    assert_eq!(workout.exercises[0].exercise.sets, Some(3));
}

#[tokio::test]
async fn test_process_workout_text_unparseable_reply_is_502() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-1.5-flash-latest:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(gemini_reply("Sorry, I could not understand that workout."))
        .create_async()
        .await;

    let pool = common::setup_test_db();
    let app = common::create_test_app_with_llm(pool.clone(), common::llm_config(&server.url()));
    let (user, cookie) = common::login(&pool, "lifter").await;

    let response = app
        .router
        .oneshot(common::json_request(
            "POST",
            "/api/ai/process-workout-text",
            Some(&cookie),
            json!({"workout_text": "did stuff", "workout_date": "2024-03-04"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);

    assert_eq!(common::count_workouts(&pool, &user.id), 0);
}

#[tokio::test]
async fn test_process_workout_text_requires_text() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (_user, cookie) = common::login(&pool, "lifter").await;

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/api/ai/process-workout-text",
            Some(&cookie),
            json!({"workout_text": "   ", "workout_date": "2024-03-04"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_api_key_is_503() {
    let pool = common::setup_test_db();
    let mut config = common::llm_config("http://127.0.0.1:9");
    config.gemini_api_key = None;
    let app = common::create_test_app_with_llm(pool.clone(), config);
    let (_user, cookie) = common::login(&pool, "lifter").await;

    let response = app
        .router
        .oneshot(common::json_request(
            "POST",
            "/api/ai/process-workout-text",
            Some(&cookie),
            json!({"workout_text": "squats", "workout_date": "2024-03-04"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Gemini API key not configured");
}

#[tokio::test]
async fn test_provider_connection_tests() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(chat_reply("{\"status\": \"success\"}"))
        .create_async()
        .await;

    let pool = common::setup_test_db();
    let app = common::create_test_app_with_llm(pool.clone(), common::llm_config(&server.url()));
    let (_user, cookie) = common::login(&pool, "lifter").await;

    let response = app
        .router
        .clone()
        .oneshot(common::get("/api/ai/test/openai", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["provider"], "openai");

    // No key configured: still 200, failure in the body
    let response = app
        .router
        .clone()
        .oneshot(common::get("/api/ai/test/aiml", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["api_key_present"], false);

    let response = app
        .router
        .oneshot(common::get("/api/ai/test/claude", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_and_parse_plan() {
    let mut server = mockito::Server::new_async().await;
    let reply = json!({
        "workouts": [
            {
                "date": "2024-03-04",
                "category": "push",
                "duration_minutes": 45,
                "exercises": [
                    {"exercise_name": "Bench Press", "sets": 4, "reps": 8, "weight_kg": 70},
                    {"exercise_name": "Dips", "sets": 3, "reps": 12}
                ]
            },
            {
                "date": "2024-03-05",
                "category": "legs",
                "exercises": [{"exercise_name": "Squat", "sets": 5, "reps": 5, "weight_kg": 100}]
            },
            {"date": "someday", "category": "pull", "exercises": []},
            {"date": "2024-03-07", "category": "stretching", "exercises": []}
        ]
    });
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer openai-key")
        .match_body(Matcher::PartialJson(json!({"model": "gpt-4o", "max_tokens": 4000})))
        .with_status(200)
        .with_body(chat_reply(&reply.to_string()))
        .create_async()
        .await;

    let pool = common::setup_test_db();
    let app = common::create_test_app_with_llm(pool.clone(), common::llm_config(&server.url()));
    let (user, cookie) = common::login(&pool, "lifter").await;

    let pdf = STANDARD.encode(b"%PDF-1.4 training plan");
    let response = app
        .router
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/plans",
            Some(&cookie),
            json!({"name": "Spring block", "file": format!("data:application/pdf;base64,{}", pdf)}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    let plan_id = body["plan"]["id"].as_str().unwrap().to_string();
    let file_url = body["plan"]["file_url"].as_str().unwrap();
    assert!(file_url.starts_with("http://fitlog.test/storage/workout-plans/plan_"));

    let response = app
        .router
        .oneshot(common::empty_request(
            "POST",
            &format!("/api/plans/{}/parse", plan_id),
            Some(&cookie),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["workouts_created"], 2);
    assert_eq!(body["exercises_created"], 3);
    assert_eq!(
        body["message"],
        "Successfully created 2 workout sessions with 3 exercises"
    );
    mock.assert_async().await;

    let repo = WorkoutRepository::new(pool.clone());
    let workouts = repo
        .find_in_range(&user.id, common::date(2024, 3, 4), common::date(2024, 3, 10))
        .await
        .unwrap();
    assert_eq!(workouts.len(), 2);
    assert!(workouts
        .iter()
        .all(|w| w.session.workout_plan_id.as_deref() == Some(plan_id.as_str())));
}
