use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/tasks/:week/:day/:index/toggle", post(handlers::toggle_task_form))
        .route("/weeks/:week/select", post(handlers::select_week_form))
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/state", get(handlers::get_state))
        .route("/api/tasks/toggle", post(handlers::toggle_task))
        .route("/api/week", post(handlers::select_week))
        .route("/api/bookmarks", get(handlers::list_bookmarks))
        .route("/api/bookmarks/toggle", post(handlers::toggle_bookmark))
        .route("/api/notes", put(handlers::put_note))
        .route("/api/notes/:week/:day", get(handlers::get_note))
        .route("/api/search", get(handlers::search))
        .route("/api/reset", post(handlers::reset))
        .route("/api/export", get(handlers::export))
        .route("/api/chat", post(handlers::chat))
        .with_state(state)
}
