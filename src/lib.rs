//! Kasool - study portal core for baccalaureate exam preparation
//!
//! Kasool organizes subjects and their lesson materials, searches them,
//! tracks per-material progress and runs multiple-choice quizzes, with
//! quiz generation and a study assistant powered by Claude.

pub mod app;
pub mod assistant;
pub mod catalog;
pub mod claude;
pub mod clock;
pub mod config;
pub mod progress;
pub mod quiz;
pub mod search;

pub use app::App;
pub use catalog::Catalog;
pub use clock::Clock;
pub use config::Config;
