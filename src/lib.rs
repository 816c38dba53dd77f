pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod scraping;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use routes::{create_router, AppState, StartupError};
