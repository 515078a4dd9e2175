pub mod app;
pub mod catalog;
pub mod chatbot;
pub mod config;
pub mod directory;
pub mod errors;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod overlay;
pub mod scoring;
pub mod state;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{load_base, load_data};
