use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Extension, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::DbPool;
use crate::handlers::{
    ai, auth, dashboard, exercises, health, photos, plans, reports, shared, storage, workouts,
};
use crate::llm::LlmClient;
use crate::middleware::AuthContext;
use crate::repositories::{
    ExerciseRepository, PhotoRepository, PlanRepository, ReportRepository, SessionRepository,
    UserRepository, WorkoutRepository,
};
use crate::storage::Storage;

/// Base64 photo and PDF uploads arrive in JSON bodies.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Every handler state the router needs.
pub struct AppStates {
    pub pool: DbPool,
    pub auth: auth::AuthState,
    pub dashboard: dashboard::DashboardState,
    pub workouts: workouts::WorkoutsState,
    pub exercises: exercises::ExercisesState,
    pub photos: photos::PhotosState,
    pub plans: plans::PlansState,
    pub ai: ai::AiState,
    pub reports: reports::ReportsState,
    pub shared: shared::SharedState,
    pub storage: Storage,
}

impl AppStates {
    pub fn new(pool: DbPool, storage: Storage, llm: LlmClient, public_base_url: &str) -> Self {
        // Create repositories
        let user_repo = UserRepository::new(pool.clone());
        let session_repo = SessionRepository::new(pool.clone());
        let workout_repo = WorkoutRepository::new(pool.clone());
        let exercise_repo = ExerciseRepository::new(pool.clone());
        let photo_repo = PhotoRepository::new(pool.clone());
        let plan_repo = PlanRepository::new(pool.clone());
        let report_repo = ReportRepository::new(pool.clone());

        Self {
            auth: auth::AuthState {
                user_repo: user_repo.clone(),
                session_repo,
            },
            dashboard: dashboard::DashboardState {
                workout_repo: workout_repo.clone(),
                photo_repo: photo_repo.clone(),
            },
            workouts: workouts::WorkoutsState {
                workout_repo: workout_repo.clone(),
                exercise_repo: exercise_repo.clone(),
                plan_repo: plan_repo.clone(),
            },
            exercises: exercises::ExercisesState { exercise_repo },
            photos: photos::PhotosState {
                photo_repo,
                storage: storage.clone(),
            },
            plans: plans::PlansState {
                plan_repo,
                workout_repo: workout_repo.clone(),
                storage: storage.clone(),
                llm: llm.clone(),
            },
            ai: ai::AiState { llm, workout_repo },
            reports: reports::ReportsState {
                report_repo: report_repo.clone(),
                public_base_url: public_base_url.trim_end_matches('/').to_string(),
            },
            shared: shared::SharedState {
                report_repo,
                user_repo,
            },
            storage,
            pool,
        }
    }
}

pub fn create_router(states: AppStates) -> Router {
    let auth_context = AuthContext {
        session_repo: states.auth.session_repo.clone(),
        user_repo: states.auth.user_repo.clone(),
    };

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        .with_state(states.pool)
        // Dashboard
        .route("/", get(dashboard::index))
        .with_state(states.dashboard)
        // Auth routes
        .route(
            "/auth/login",
            get(auth::login_page).post(auth::login_submit),
        )
        .route(
            "/auth/register",
            get(auth::register_page).post(auth::register_submit),
        )
        .route("/auth/logout", post(auth::logout))
        .with_state(states.auth)
        // Workout routes
        .route(
            "/api/workouts",
            get(workouts::list).post(workouts::create),
        )
        .route("/api/workouts/today", get(workouts::today_workouts))
        .route("/api/workouts/copy-schedule", post(workouts::copy_schedule))
        .route(
            "/api/workouts/{id}",
            get(workouts::show)
                .put(workouts::update)
                .delete(workouts::delete),
        )
        .route("/api/workouts/{id}/exercises", post(workouts::add_exercise))
        .with_state(states.workouts)
        // Exercise routes
        .route(
            "/api/exercises/{id}",
            put(exercises::update).delete(exercises::delete),
        )
        .route(
            "/api/exercises/{id}/sets",
            get(exercises::get_sets).put(exercises::replace_sets),
        )
        .with_state(states.exercises)
        // Progress photos
        .route(
            "/api/photos",
            get(photos::list)
                .post(photos::upload)
                .delete(photos::delete_week),
        )
        .route("/api/photos/{id}", axum::routing::delete(photos::delete_one))
        .with_state(states.photos)
        // Workout plans
        .route("/api/plans", get(plans::list).post(plans::upload))
        .route("/api/plans/{id}", axum::routing::delete(plans::delete))
        .route("/api/plans/{id}/parse", post(plans::parse))
        .with_state(states.plans)
        // AI
        .route(
            "/api/ai/process-workout-text",
            post(ai::process_workout_text),
        )
        .route("/api/ai/test/{provider}", get(ai::test_provider))
        .with_state(states.ai)
        // Reports
        .route("/reports/weekly", get(reports::weekly))
        .route("/api/reports/share", post(reports::create_share))
        .route(
            "/api/reports/share/{id}/revoke",
            post(reports::revoke_share),
        )
        .route("/api/reports/comments", get(reports::comments))
        .with_state(states.reports)
        // Public shared reports
        .route("/share/{token}", get(shared::page))
        .route("/share/{token}/comments", post(shared::comment_form))
        .route("/api/shared/{token}", get(shared::api_get))
        .route("/api/shared/{token}/comments", post(shared::api_comment))
        .with_state(states.shared)
        // Stored objects
        .route("/storage/{bucket}/{name}", get(storage::serve_object))
        .with_state(states.storage)
        .layer(Extension(auth_context))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
