pub mod app;
pub mod chat;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod plan;
pub mod progress;
pub mod search;
pub mod storage;
pub mod store;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::{Config, Edition};
pub use plan::StudyPlan;
pub use state::AppState;
pub use storage::load_store;
pub use store::ProgressStore;
