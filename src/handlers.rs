use crate::chat::APOLOGY;
use crate::errors::AppError;
use crate::models::{
    BookmarkEntry, BookmarkResponse, ChatReply, ChatRequest, DayRequest, ExportReport, Note,
    PersistedState, ProgressResponse, ResetRequest, SearchHit, SearchQuery, SelectWeekRequest,
    ToggleTaskRequest, ToggleTaskResponse,
};
use crate::plan::{DayKey, TaskCoord};
use crate::progress::{build_progress, is_milestone};
use crate::search::search as search_plan;
use crate::state::AppState;
use crate::storage::persist_state;
use crate::store::{ProgressStore, StoreError};
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
    Json,
};
use chrono::Utc;
use tokio::sync::MutexGuard;
use tracing::{error, info};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let store = state.store.lock().await;
    Html(render_index(&store, state.features))
}

pub async fn get_progress(State(state): State<AppState>) -> Result<Json<ProgressResponse>, AppError> {
    let store = state.store.lock().await;
    Ok(Json(build_progress(&store)))
}

pub async fn get_state(State(state): State<AppState>) -> Result<Json<PersistedState>, AppError> {
    let store = state.store.lock().await;
    Ok(Json(store.serialize()))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Json(payload): Json<ToggleTaskRequest>,
) -> Result<Json<ToggleTaskResponse>, AppError> {
    let coord = TaskCoord::new(payload.week, payload.day, payload.index);
    Ok(Json(apply_toggle(&state, coord).await?))
}

pub async fn toggle_task_form(
    State(state): State<AppState>,
    Path((week, day, index)): Path<(u32, u32, usize)>,
) -> Result<Redirect, AppError> {
    apply_toggle(&state, TaskCoord::new(week, day, index)).await?;
    Ok(Redirect::to("/"))
}

pub async fn select_week(
    State(state): State<AppState>,
    Json(payload): Json<SelectWeekRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let ((), store) = commit(&state, |store| store.select_week(payload.week)).await?;
    Ok(Json(build_progress(&store)))
}

pub async fn select_week_form(
    State(state): State<AppState>,
    Path(week): Path<u32>,
) -> Result<Redirect, AppError> {
    commit(&state, |store| store.select_week(week)).await?;
    Ok(Redirect::to("/"))
}

pub async fn list_bookmarks(State(state): State<AppState>) -> Result<Json<Vec<BookmarkEntry>>, AppError> {
    require(state.features.bookmarks, "bookmarks")?;
    let store = state.store.lock().await;
    let entries = store
        .bookmarks()
        .map(|key| BookmarkEntry {
            week: key.week,
            day: key.day,
            title: store
                .plan()
                .day(key)
                .map(|day| day.title.clone())
                .unwrap_or_else(|| format!("Week {}, Day {}", key.week, key.day)),
        })
        .collect();
    Ok(Json(entries))
}

pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Json(payload): Json<DayRequest>,
) -> Result<Json<BookmarkResponse>, AppError> {
    require(state.features.bookmarks, "bookmarks")?;
    let key = DayKey::new(payload.week, payload.day);
    let (bookmarked, _) = commit(&state, |store| store.toggle_bookmark(key)).await?;
    Ok(Json(BookmarkResponse {
        week: key.week,
        day: key.day,
        bookmarked,
    }))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path((week, day)): Path<(u32, u32)>,
) -> Result<Json<Note>, AppError> {
    require(state.features.notes, "notes")?;
    let key = DayKey::new(week, day);
    let store = state.store.lock().await;
    if store.plan().day(key).is_none() {
        return Err(AppError::not_found(format!("unknown day: {key}")));
    }
    Ok(Json(Note {
        week,
        day,
        text: store.note(key).unwrap_or_default().to_string(),
    }))
}

pub async fn put_note(
    State(state): State<AppState>,
    Json(payload): Json<Note>,
) -> Result<Json<Note>, AppError> {
    require(state.features.notes, "notes")?;
    let key = DayKey::new(payload.week, payload.day);
    commit(&state, |store| store.set_note(key, payload.text.clone())).await?;
    Ok(Json(payload))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, AppError> {
    require(state.features.search, "search")?;
    let store = state.store.lock().await;
    Ok(Json(search_plan(store.plan(), &query.q)))
}

pub async fn reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    if !payload.confirm {
        return Err(AppError::bad_request("reset requires confirm: true"));
    }
    let ((), store) = commit(&state, |store| {
        store.reset();
        Ok(())
    })
    .await?;
    info!("progress reset");
    Ok(Json(build_progress(&store)))
}

pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let report: ExportReport = state.store.lock().await.export_snapshot(now);
    let disposition = format!(
        "attachment; filename=\"malta-study-plan-progress-{}.json\"",
        now.format("%Y-%m-%d")
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(report)))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }

    let Some(client) = state.chat.as_ref() else {
        error!("chat request received but no chat API is configured");
        return Ok(Json(ChatReply {
            reply: APOLOGY.to_string(),
        }));
    };

    let reply = match client.ask(message).await {
        Ok(text) => text,
        Err(err) => {
            error!("chat API error: {err}");
            APOLOGY.to_string()
        }
    };
    Ok(Json(ChatReply { reply }))
}

async fn apply_toggle(state: &AppState, coord: TaskCoord) -> Result<ToggleTaskResponse, AppError> {
    let (completed, store) = commit(state, |store| store.toggle_task(coord)).await?;

    Ok(ToggleTaskResponse {
        completed,
        milestone: is_milestone(store.completed_count(), completed),
        progress: build_progress(&store),
    })
}

/// Applies `change` to a copy of the store and swaps it in only once the
/// snapshot is on disk, so a failed save leaves memory untouched.
async fn commit<T>(
    state: &AppState,
    change: impl FnOnce(&mut ProgressStore) -> Result<T, StoreError>,
) -> Result<(T, MutexGuard<'_, ProgressStore>), AppError> {
    let mut store = state.store.lock().await;
    let mut next = store.clone();
    let out = change(&mut next)?;
    persist_state(&state.data_path, &next.serialize())
        .await
        .inspect_err(|err| error!("failed to persist state: {}", err.message))?;
    *store = next;
    Ok((out, store))
}

fn require(enabled: bool, feature: &str) -> Result<(), AppError> {
    if enabled {
        Ok(())
    } else {
        Err(AppError::not_found(format!("{feature} not available in this edition")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Edition;
    use crate::plan::StudyPlan;
    use std::sync::Arc;

    /// A directory cannot be written as a file, so every save fails.
    fn unwritable_state() -> AppState {
        let plan = Arc::new(StudyPlan::default_plan());
        AppState::new(
            std::env::temp_dir(),
            ProgressStore::new(plan),
            Edition::Full.features(),
            None,
        )
    }

    #[tokio::test]
    async fn failed_save_keeps_task_unchanged() {
        let state = unwritable_state();
        let result = apply_toggle(&state, TaskCoord::new(1, 1, 0)).await;
        assert!(result.is_err());

        let store = state.store.lock().await;
        assert_eq!(store.completed_count(), 0);
        assert!(!store.is_completed(TaskCoord::new(1, 1, 0)));
    }

    #[tokio::test]
    async fn failed_save_keeps_bookmarks_notes_and_week() {
        let state = unwritable_state();
        let key = DayKey::new(2, 3);

        assert!(commit(&state, |store| store.toggle_bookmark(key)).await.is_err());
        assert!(commit(&state, |store| store.set_note(key, "draft")).await.is_err());
        assert!(commit(&state, |store| store.select_week(3)).await.is_err());

        let store = state.store.lock().await;
        assert!(!store.is_bookmarked(key));
        assert_eq!(store.note(key), None);
        assert_eq!(store.current_week(), 1);
    }

    #[tokio::test]
    async fn failed_save_does_not_reset() {
        let state = unwritable_state();
        state
            .store
            .lock()
            .await
            .toggle_task(TaskCoord::new(1, 1, 0))
            .unwrap();

        let result = commit(&state, |store| {
            store.reset();
            Ok(())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(state.store.lock().await.completed_count(), 1);
    }

    #[tokio::test]
    async fn unknown_task_is_rejected_before_saving() {
        let state = unwritable_state();
        let err = apply_toggle(&state, TaskCoord::new(9, 1, 0)).await.err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }
}
