pub mod exercise_repo;
pub mod photo_repo;
pub mod plan_repo;
pub mod report_repo;
pub mod session_repo;
pub mod user_repo;
pub mod workout_repo;

pub use exercise_repo::ExerciseRepository;
pub use photo_repo::PhotoRepository;
pub use plan_repo::PlanRepository;
pub use report_repo::ReportRepository;
pub use session_repo::SessionRepository;
pub use user_repo::UserRepository;
pub use workout_repo::WorkoutRepository;
