mod app;
pub mod config;
pub mod effects;
pub mod events;
pub mod terminal;
pub mod ui;

pub use app::{run_app, AppError};
