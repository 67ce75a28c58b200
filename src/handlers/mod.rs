pub mod ai;
pub mod auth;
pub mod dashboard;
pub mod exercises;
pub mod extract;
pub mod health;
pub mod photos;
pub mod plans;
pub mod reports;
pub mod shared;
pub mod storage;
pub mod workouts;
