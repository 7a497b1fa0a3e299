pub mod app;
pub mod commands;
pub mod config;
pub mod detector;
pub mod engine;
pub mod errors;
pub mod indicators;
pub mod marketdata;
pub mod notify;
pub mod telemetry;
pub mod utils;

pub use app::App;
pub use config::Settings;
pub use errors::{AppError, AppResult};
