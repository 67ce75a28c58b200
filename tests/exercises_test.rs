mod common;

use axum::http::StatusCode;
use fitlog::models::WorkoutCategory;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_progressive_overload_flag() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (user, cookie) = common::login(&pool, "lifter").await;
    common::create_test_workout(
        &pool,
        &user.id,
        common::date(2024, 3, 4),
        WorkoutCategory::Push,
        json!([{"exercise_name": "Bench Press", "sets": 3, "reps": 10, "weight_kg": 80}]),
    )
    .await;

    let response = app
        .oneshot(common::json_request(
            "POST",
            "/api/workouts",
            Some(&cookie),
            json!({
                "date": "2024-03-11",
                "category": "push",
                "exercises": [
                    {"exercise_name": "Bench Press", "sets": 3, "reps": 8, "weight_kg": 82.5},
                    {"exercise_name": "Overhead Press", "sets": 3, "reps": 8, "weight_kg": 50}
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    let bench = &body["workout"]["exercises"][0];
    assert_eq!(bench["is_progressive"], true);
    assert_eq!(bench["previous_weight_kg"], 80.0);
    assert_eq!(bench["weight_improvement_kg"], 2.5);

    // First time this exercise shows up
    let press = &body["workout"]["exercises"][1];
    assert_eq!(press["is_progressive"], false);
    assert!(press["previous_weight_kg"].is_null());
}

#[tokio::test]
async fn test_same_weight_is_not_progressive() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (user, cookie) = common::login(&pool, "lifter").await;
    let workout = common::create_test_workout(
        &pool,
        &user.id,
        common::date(2024, 3, 4),
        WorkoutCategory::Legs,
        json!([{"exercise_name": "Squat", "weight_kg": 100}]),
    )
    .await;
    let later = common::create_test_workout(
        &pool,
        &user.id,
        common::date(2024, 3, 11),
        WorkoutCategory::Legs,
        json!([]),
    )
    .await;
    assert_eq!(workout.exercises.len(), 1);

    let response = app
        .oneshot(common::json_request(
            "POST",
            &format!("/api/workouts/{}/exercises", later.session.id),
            Some(&cookie),
            json!({"exercise_name": "Squat", "weight_kg": 100}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["exercise"]["is_progressive"], false);
    assert_eq!(body["exercise"]["previous_weight_kg"], 100.0);
}

#[tokio::test]
async fn test_update_exercise_recomputes_overload() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (user, cookie) = common::login(&pool, "lifter").await;
    common::create_test_workout(
        &pool,
        &user.id,
        common::date(2024, 3, 4),
        WorkoutCategory::Pull,
        json!([{"exercise_name": "Barbell Row", "weight_kg": 60}]),
    )
    .await;
    let later = common::create_test_workout(
        &pool,
        &user.id,
        common::date(2024, 3, 11),
        WorkoutCategory::Pull,
        json!([{"exercise_name": "Barbell Row", "weight_kg": 55}]),
    )
    .await;
    let exercise_id = &later.exercises[0].exercise.id;
    assert!(!later.exercises[0].exercise.is_progressive);

    let response = app
        .oneshot(common::json_request(
            "PUT",
            &format!("/api/exercises/{}", exercise_id),
            Some(&cookie),
            json!({"exercise_name": "Barbell Row", "sets": 4, "reps": 8, "weight_kg": 65}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["exercise"]["is_progressive"], true);
    assert_eq!(body["exercise"]["weight_improvement_kg"], 5.0);
    assert_eq!(body["exercise"]["sets"], 4);
}

#[tokio::test]
async fn test_replace_and_get_sets() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (user, cookie) = common::login(&pool, "lifter").await;
    let workout = common::create_test_workout(
        &pool,
        &user.id,
        common::date(2024, 3, 4),
        WorkoutCategory::Push,
        json!([{
            "exercise_name": "Bench Press",
            "exercise_sets": [{"set_number": 1, "reps": 10, "weight_kg": 80}]
        }]),
    )
    .await;
    let uri = format!(
        "/api/exercises/{}/sets",
        workout.exercises[0].exercise.id
    );

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            &uri,
            Some(&cookie),
            json!({"sets": [
                {"set_number": 2, "reps": 8, "weight_kg": 85},
                {"set_number": 1, "reps": 10, "weight_kg": 80},
                {"set_number": 3, "reps": 6, "weight_kg": "87.5"}
            ]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(common::get(&uri, Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let sets = body["sets"].as_array().unwrap();
    assert_eq!(sets.len(), 3);
    assert_eq!(sets[0]["set_number"], 1);
    assert_eq!(sets[2]["weight_kg"], 87.5);
}

#[tokio::test]
async fn test_replace_sets_rejects_duplicate_numbers() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (user, cookie) = common::login(&pool, "lifter").await;
    let workout = common::create_test_workout(
        &pool,
        &user.id,
        common::date(2024, 3, 4),
        WorkoutCategory::Push,
        json!([{"exercise_name": "Bench Press"}]),
    )
    .await;

    let response = app
        .oneshot(common::json_request(
            "PUT",
            &format!("/api/exercises/{}/sets", workout.exercises[0].exercise.id),
            Some(&cookie),
            json!({"sets": [
                {"set_number": 1, "reps": 10},
                {"set_number": 1, "reps": 8}
            ]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_exercise_removes_sets() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let (user, cookie) = common::login(&pool, "lifter").await;
    let workout = common::create_test_workout(
        &pool,
        &user.id,
        common::date(2024, 3, 4),
        WorkoutCategory::Push,
        json!([{
            "exercise_name": "Bench Press",
            "exercise_sets": [
                {"set_number": 1, "reps": 10, "weight_kg": 80},
                {"set_number": 2, "reps": 10, "weight_kg": 80}
            ]
        }]),
    )
    .await;

    let response = app
        .oneshot(common::empty_request(
            "DELETE",
            &format!("/api/exercises/{}", workout.exercises[0].exercise.id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let conn = pool.get().unwrap();
    let sets: i64 = conn
        .query_row("SELECT COUNT(*) FROM exercise_sets", [], |row| row.get(0))
        .unwrap();
    assert_eq!(sets, 0);
}

#[tokio::test]
async fn test_other_users_exercise_is_404() {
    let pool = common::setup_test_db();
    let app = common::create_test_app(pool.clone());
    let owner = common::create_test_user(&pool, "owner", "password123").await;
    let (_intruder, cookie) = common::login(&pool, "intruder").await;
    let workout = common::create_test_workout(
        &pool,
        &owner.id,
        common::date(2024, 3, 4),
        WorkoutCategory::Push,
        json!([{"exercise_name": "Bench Press", "weight_kg": 80}]),
    )
    .await;
    let id = &workout.exercises[0].exercise.id;

    let response = app
        .clone()
        .oneshot(common::get(
            &format!("/api/exercises/{}/sets", id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            &format!("/api/exercises/{}", id),
            Some(&cookie),
            json!({"exercise_name": "Bench Press", "weight_kg": 200}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(common::empty_request(
            "DELETE",
            &format!("/api/exercises/{}", id),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
