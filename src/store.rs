use crate::models::{ExportReport, PersistedState, TaskDetail};
use crate::plan::{DayKey, StudyPlan, TaskCoord};
use crate::progress::percentage;
use chrono::{DateTime, SecondsFormat, Utc};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::{debug, warn};

/// Key the snapshot was historically stored under in the browser.
pub const STATE_KEY: &str = "maltaStudyPlanState";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown week: {0}")]
    UnknownWeek(u32),
    #[error("unknown day: {0}")]
    UnknownDay(DayKey),
    #[error("unknown task: {0:?}")]
    UnknownTask(TaskCoord),
}

/// Owns completion, bookmark, note and week-selection state for one study plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStore {
    plan: Arc<StudyPlan>,
    completed: BTreeSet<TaskCoord>,
    current_week: u32,
    bookmarks: BTreeSet<DayKey>,
    notes: BTreeMap<DayKey, String>,
}

impl ProgressStore {
    pub fn new(plan: Arc<StudyPlan>) -> Self {
        Self {
            plan,
            completed: BTreeSet::new(),
            current_week: 1,
            bookmarks: BTreeSet::new(),
            notes: BTreeMap::new(),
        }
    }

    pub fn plan(&self) -> &StudyPlan {
        &self.plan
    }

    pub fn toggle_task(&mut self, coord: TaskCoord) -> Result<bool, StoreError> {
        if !self.plan.contains(coord) {
            return Err(StoreError::UnknownTask(coord));
        }
        if self.completed.remove(&coord) {
            Ok(false)
        } else {
            self.completed.insert(coord);
            Ok(true)
        }
    }

    pub fn is_completed(&self, coord: TaskCoord) -> bool {
        self.completed.contains(&coord)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn total_tasks(&self) -> usize {
        self.plan.task_count()
    }

    /// (completed, total) for one week. Unknown weeks count as empty.
    pub fn week_counts(&self, week: u32) -> (usize, usize) {
        let completed = self.completed.iter().filter(|c| c.week == week).count();
        (completed, self.plan.week_task_count(week))
    }

    pub fn week_percentage(&self, week: u32) -> u8 {
        let (completed, total) = self.week_counts(week);
        percentage(completed, total)
    }

    pub fn overall_percentage(&self) -> u8 {
        percentage(self.completed_count(), self.total_tasks())
    }

    pub fn current_week(&self) -> u32 {
        self.current_week
    }

    pub fn select_week(&mut self, week: u32) -> Result<(), StoreError> {
        if self.plan.week(week).is_none() {
            return Err(StoreError::UnknownWeek(week));
        }
        self.current_week = week;
        Ok(())
    }

    pub fn toggle_bookmark(&mut self, key: DayKey) -> Result<bool, StoreError> {
        if self.plan.day(key).is_none() {
            return Err(StoreError::UnknownDay(key));
        }
        if self.bookmarks.remove(&key) {
            Ok(false)
        } else {
            self.bookmarks.insert(key);
            Ok(true)
        }
    }

    pub fn is_bookmarked(&self, key: DayKey) -> bool {
        self.bookmarks.contains(&key)
    }

    pub fn bookmarks(&self) -> impl Iterator<Item = DayKey> + '_ {
        self.bookmarks.iter().copied()
    }

    pub fn set_note(&mut self, key: DayKey, text: impl Into<String>) -> Result<(), StoreError> {
        if self.plan.day(key).is_none() {
            return Err(StoreError::UnknownDay(key));
        }
        self.notes.insert(key, text.into());
        Ok(())
    }

    pub fn note(&self, key: DayKey) -> Option<&str> {
        self.notes.get(&key).map(String::as_str)
    }

    pub fn notes(&self) -> impl Iterator<Item = (DayKey, &str)> + '_ {
        self.notes.iter().map(|(key, text)| (*key, text.as_str()))
    }

    pub fn serialize(&self) -> PersistedState {
        let completed_tasks = self
            .completed
            .iter()
            .filter_map(|coord| self.plan.flat_index(*coord))
            .collect();

        PersistedState {
            completed_tasks,
            current_week: self.current_week,
            bookmarks: self.bookmarks.iter().map(DayKey::to_string).collect(),
            notes: self
                .notes
                .iter()
                .map(|(key, text)| (key.to_string(), text.clone()))
                .collect(),
        }
    }

    /// Replaces all state with `snapshot`. Entries that no longer fit the plan are dropped.
    pub fn deserialize(&mut self, snapshot: &PersistedState) {
        let plan = Arc::clone(&self.plan);
        *self = Self::new(Arc::clone(&plan));

        for &flat in &snapshot.completed_tasks {
            match plan.coord_at(flat) {
                Some(coord) => {
                    self.completed.insert(coord);
                }
                None => debug!("dropping out-of-range task index {flat}"),
            }
        }

        if plan.week(snapshot.current_week).is_some() {
            self.current_week = snapshot.current_week;
        }

        for raw in &snapshot.bookmarks {
            match raw.parse::<DayKey>() {
                Ok(key) if plan.day(key).is_some() => {
                    self.bookmarks.insert(key);
                }
                _ => debug!("dropping bookmark {raw:?}"),
            }
        }

        for (raw, text) in &snapshot.notes {
            match raw.parse::<DayKey>() {
                Ok(key) if plan.day(key).is_some() => {
                    self.notes.insert(key, text.clone());
                }
                _ => debug!("dropping note for {raw:?}"),
            }
        }
    }

    /// Restores from raw JSON. Malformed input leaves the store at its defaults.
    pub fn restore(&mut self, raw: &str) {
        match serde_json::from_str::<PersistedState>(raw) {
            Ok(snapshot) => self.deserialize(&snapshot),
            Err(err) => {
                warn!("discarding malformed {STATE_KEY} snapshot: {err}");
                self.reset();
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(Arc::clone(&self.plan));
    }

    pub fn export_snapshot(&self, at: DateTime<Utc>) -> ExportReport {
        let task_details = self
            .plan
            .coords()
            .map(|coord| TaskDetail {
                week: coord.week,
                day: coord.day,
                task_index: coord.index,
                task_text: self.plan.task_text(coord).unwrap_or_default().to_string(),
                completed: self.is_completed(coord),
            })
            .collect();

        let week_progress = (1..=self.plan.week_count())
            .map(|week| (week, self.week_percentage(week)))
            .collect();

        ExportReport {
            export_date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_tasks: self.total_tasks(),
            completed_tasks: self.completed_count(),
            overall_progress: self.overall_percentage(),
            week_progress,
            task_details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Day, Week};
    use chrono::TimeZone;

    fn grid_plan(weeks: u32, tasks_per_week: usize) -> Arc<StudyPlan> {
        Arc::new(StudyPlan {
            title: "grid".to_string(),
            weeks: (1..=weeks)
                .map(|w| Week {
                    title: format!("Week {w}"),
                    days: vec![Day {
                        title: format!("Week {w} day"),
                        tasks: (0..tasks_per_week).map(|i| format!("task {i}")).collect(),
                    }],
                })
                .collect(),
        })
    }

    #[test]
    fn week_without_tasks_is_zero_percent() {
        let plan = Arc::new(StudyPlan {
            title: "empty".to_string(),
            weeks: vec![Week {
                title: "Empty".to_string(),
                days: vec![],
            }],
        });
        let store = ProgressStore::new(plan);
        assert_eq!(store.week_percentage(1), 0);
        assert_eq!(store.week_percentage(7), 0);
        assert_eq!(store.overall_percentage(), 0);
    }

    #[test]
    fn three_of_five_in_week_one() {
        let mut store = ProgressStore::new(grid_plan(4, 5));
        for i in 0..3 {
            assert!(store.toggle_task(TaskCoord::new(1, 1, i)).unwrap());
        }
        assert_eq!(store.week_percentage(1), 60);
        assert_eq!(store.week_percentage(2), 0);
        assert_eq!(store.overall_percentage(), 15);
    }

    #[test]
    fn overall_matches_rounded_ratio() {
        let mut store = ProgressStore::new(grid_plan(3, 3));
        let coords: Vec<_> = store.plan().coords().collect();
        for (n, coord) in coords.iter().enumerate() {
            store.toggle_task(*coord).unwrap();
            let expected = ((n + 1) as f64 / coords.len() as f64 * 100.0).round() as u8;
            assert_eq!(store.overall_percentage(), expected);
        }
    }

    #[test]
    fn double_toggle_restores_state() {
        let mut store = ProgressStore::new(grid_plan(4, 5));
        store.toggle_task(TaskCoord::new(2, 1, 4)).unwrap();
        let before = store.clone();
        let coord = TaskCoord::new(3, 1, 0);

        assert!(store.toggle_task(coord).unwrap());
        assert!(!store.toggle_task(coord).unwrap());

        assert_eq!(store, before);
        assert_eq!(store.overall_percentage(), before.overall_percentage());
        assert_eq!(store.week_percentage(3), before.week_percentage(3));
    }

    #[test]
    fn toggle_rejects_unknown_task() {
        let mut store = ProgressStore::new(grid_plan(1, 2));
        let coord = TaskCoord::new(1, 1, 2);
        assert_eq!(store.toggle_task(coord), Err(StoreError::UnknownTask(coord)));
        assert_eq!(store.select_week(2), Err(StoreError::UnknownWeek(2)));
    }

    #[test]
    fn bookmark_toggle_twice_leaves_set_empty() {
        let mut store = ProgressStore::new(Arc::new(StudyPlan::default_plan()));
        let key = DayKey::new(2, 3);
        assert!(store.toggle_bookmark(key).unwrap());
        assert!(store.is_bookmarked(key));
        assert!(!store.toggle_bookmark(key).unwrap());
        assert_eq!(store.bookmarks().count(), 0);
        assert_eq!(store.completed_count(), 0);
    }

    #[test]
    fn note_is_last_write_wins() {
        let mut store = ProgressStore::new(Arc::new(StudyPlan::default_plan()));
        let key = DayKey::new(1, 2);
        store.set_note(key, "first").unwrap();
        store.set_note(key, "second").unwrap();
        assert_eq!(store.note(key), Some("second"));
        assert_eq!(store.notes().count(), 1);
        assert!(store.set_note(DayKey::new(9, 1), "x").is_err());
    }

    #[test]
    fn serialize_round_trips() {
        let plan = Arc::new(StudyPlan::default_plan());
        let mut store = ProgressStore::new(Arc::clone(&plan));
        store.toggle_task(TaskCoord::new(1, 1, 0)).unwrap();
        store.toggle_task(TaskCoord::new(3, 2, 1)).unwrap();
        store.select_week(3).unwrap();
        store.toggle_bookmark(DayKey::new(2, 3)).unwrap();
        store.set_note(DayKey::new(4, 1), "ask about lithium levels").unwrap();

        let snapshot = store.serialize();
        let mut restored = ProgressStore::new(plan);
        restored.deserialize(&snapshot);

        assert_eq!(restored, store);
        assert_eq!(restored.serialize(), snapshot);
    }

    #[test]
    fn serialize_uses_flat_indices_and_string_keys() {
        let mut store = ProgressStore::new(grid_plan(2, 3));
        store.toggle_task(TaskCoord::new(2, 1, 1)).unwrap();
        store.toggle_bookmark(DayKey::new(1, 1)).unwrap();
        store.set_note(DayKey::new(2, 1), "hi").unwrap();

        let json = serde_json::to_value(store.serialize()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "completedTasks": [4],
                "currentWeek": 1,
                "bookmarks": ["1-1"],
                "notes": { "2-1": "hi" }
            })
        );
    }

    #[test]
    fn restore_accepts_schema_without_bookmarks_or_notes() {
        let mut store = ProgressStore::new(grid_plan(2, 3));
        store.restore(r#"{"completedTasks":[0,5],"currentWeek":2}"#);
        assert!(store.is_completed(TaskCoord::new(1, 1, 0)));
        assert!(store.is_completed(TaskCoord::new(2, 1, 2)));
        assert_eq!(store.current_week(), 2);
        assert_eq!(store.bookmarks().count(), 0);
    }

    #[test]
    fn restore_treats_null_fields_as_absent() {
        let mut store = ProgressStore::new(grid_plan(2, 3));
        store.restore(r#"{"completedTasks":[0,1],"currentWeek":2,"bookmarks":null,"notes":null}"#);
        assert_eq!(store.completed_count(), 2);
        assert_eq!(store.current_week(), 2);
        assert_eq!(store.bookmarks().count(), 0);
        assert_eq!(store.notes().count(), 0);

        store.restore(r#"{"completedTasks":[3],"currentWeek":null}"#);
        assert_eq!(store.completed_count(), 1);
        assert_eq!(store.current_week(), 1);
    }

    #[test]
    fn restore_falls_back_to_defaults_on_garbage() {
        let plan = grid_plan(2, 3);
        let mut store = ProgressStore::new(Arc::clone(&plan));
        store.toggle_task(TaskCoord::new(1, 1, 0)).unwrap();

        store.restore("not json");
        assert_eq!(store, ProgressStore::new(Arc::clone(&plan)));

        store.restore(r#"{"currentWeek":2}"#);
        assert_eq!(store, ProgressStore::new(plan));
    }

    #[test]
    fn deserialize_drops_stale_entries() {
        let mut store = ProgressStore::new(grid_plan(2, 3));
        store.deserialize(&PersistedState {
            completed_tasks: vec![1, 99],
            current_week: 12,
            bookmarks: vec!["1-1".into(), "banana".into(), "5-1".into()],
            notes: [("2-1".to_string(), "keep".to_string()), ("x".to_string(), "drop".to_string())]
                .into_iter()
                .collect(),
        });
        assert_eq!(store.completed_count(), 1);
        assert_eq!(store.current_week(), 1);
        assert_eq!(store.bookmarks().collect::<Vec<_>>(), vec![DayKey::new(1, 1)]);
        assert_eq!(store.note(DayKey::new(2, 1)), Some("keep"));
        assert_eq!(store.notes().count(), 1);
    }

    #[test]
    fn reset_matches_fresh_store() {
        let plan = Arc::new(StudyPlan::default_plan());
        let mut store = ProgressStore::new(Arc::clone(&plan));
        store.toggle_task(TaskCoord::new(2, 2, 2)).unwrap();
        store.select_week(4).unwrap();
        store.toggle_bookmark(DayKey::new(1, 5)).unwrap();
        store.set_note(DayKey::new(1, 5), "review").unwrap();

        store.reset();
        assert_eq!(store, ProgressStore::new(plan));
    }

    #[test]
    fn export_is_denormalized() {
        let mut store = ProgressStore::new(grid_plan(2, 2));
        store.toggle_task(TaskCoord::new(1, 1, 1)).unwrap();
        let before = store.clone();

        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let report = store.export_snapshot(at);

        assert_eq!(report.export_date, "2026-03-01T09:30:00.000Z");
        assert_eq!(report.total_tasks, 4);
        assert_eq!(report.completed_tasks, 1);
        assert_eq!(report.overall_progress, 25);
        assert_eq!(report.week_progress.get(&1), Some(&50));
        assert_eq!(report.week_progress.get(&2), Some(&0));
        assert_eq!(report.task_details.len(), 4);
        assert_eq!(
            report.task_details[1],
            TaskDetail {
                week: 1,
                day: 1,
                task_index: 1,
                task_text: "task 1".to_string(),
                completed: true,
            }
        );
        assert_eq!(store, before);
    }
}
