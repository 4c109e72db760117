use crate::models::{ProgressResponse, WeekSummary};
use crate::store::ProgressStore;

/// Rounded `completed / total` as a whole percentage. Zero total is 0%.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (completed.min(total) as f64 / total as f64) * 100.0;
    pct.round() as u8
}

/// A celebration fires on every fifth completed task, only when ticking a task on.
pub fn is_milestone(completed_count: usize, just_completed: bool) -> bool {
    just_completed && completed_count > 0 && completed_count % 5 == 0
}

pub fn progress_text(completed: usize, total: usize) -> String {
    format!("{completed} of {total} tasks completed")
}

pub fn build_progress(store: &ProgressStore) -> ProgressResponse {
    let plan = store.plan();
    let weeks = plan
        .weeks
        .iter()
        .enumerate()
        .map(|(idx, week)| {
            let number = idx as u32 + 1;
            let (completed, total) = store.week_counts(number);
            let percentage = percentage(completed, total);
            WeekSummary {
                week: number,
                title: week.title.clone(),
                completed,
                total,
                percentage,
                complete: percentage == 100,
            }
        })
        .collect();

    let completed = store.completed_count();
    let total = store.total_tasks();

    ProgressResponse {
        current_week: store.current_week(),
        completed,
        total,
        overall_percentage: store.overall_percentage(),
        progress_text: progress_text(completed, total),
        weeks,
    }
}
