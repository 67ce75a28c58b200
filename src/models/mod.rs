pub mod exercise;
pub mod exercise_set;
pub mod from_row;
pub mod lenient;
pub mod progress_photo;
pub mod report;
pub mod shared_report;
pub mod user;
pub mod workout_plan;
pub mod workout_session;

pub use exercise::{
    Exercise, ExerciseType, ExerciseWithSets, NewExercise, ProgressiveOverload, UpdateExercise,
};
pub use exercise_set::{ExerciseSet, NewExerciseSet, ReplaceExerciseSets};
pub use from_row::FromSqliteRow;
pub use progress_photo::{PhotoFile, ProgressPhoto, UploadPhotos};
pub use report::{WeekRange, WeeklyReport, WeeklyStats};
pub use shared_report::{CreateComment, CreateShare, ReportComment, SharedReport};
pub use user::{CreateUser, LoginCredentials, User};
pub use workout_plan::{UploadPlan, WorkoutPlan};
pub use workout_session::{
    CreateWorkoutSession, NewWorkoutSession, UpdateWorkoutSession, WorkoutCategory,
    WorkoutSession, WorkoutWithExercises,
};
