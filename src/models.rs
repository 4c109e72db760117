use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Full snapshot written on every save. Field names follow the browser record
/// stored under `maltaStudyPlanState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub completed_tasks: Vec<usize>,
    #[serde(default = "first_week", deserialize_with = "null_as_default")]
    pub current_week: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bookmarks: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: BTreeMap<String, String>,
}

fn first_week() -> u32 {
    1
}

/// Older snapshots may carry `null` where a field was never set.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            completed_tasks: Vec::new(),
            current_week: first_week(),
            bookmarks: Vec::new(),
            notes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub week: u32,
    pub day: u32,
    pub task_index: usize,
    pub task_text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub export_date: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overall_progress: u8,
    pub week_progress: BTreeMap<u32, u8>,
    pub task_details: Vec<TaskDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week: u32,
    pub title: String,
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
    pub complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub current_week: u32,
    pub completed: usize,
    pub total: usize,
    pub overall_percentage: u8,
    pub progress_text: String,
    pub weeks: Vec<WeekSummary>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleTaskRequest {
    pub week: u32,
    pub day: u32,
    pub index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleTaskResponse {
    pub completed: bool,
    pub milestone: bool,
    pub progress: ProgressResponse,
}

#[derive(Debug, Deserialize)]
pub struct SelectWeekRequest {
    pub week: u32,
}

#[derive(Debug, Deserialize)]
pub struct DayRequest {
    pub week: u32,
    pub day: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarkResponse {
    pub week: u32,
    pub day: u32,
    pub bookmarked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarkEntry {
    pub week: u32,
    pub day: u32,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Note {
    pub week: u32,
    pub day: u32,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub week: u32,
    pub day: u32,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}
