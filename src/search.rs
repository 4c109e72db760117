use crate::models::SearchHit;
use crate::plan::StudyPlan;

/// Days whose title or any task text contains `query`, ignoring case.
pub fn search(plan: &StudyPlan, query: &str) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    plan.day_keys()
        .filter_map(|key| {
            let day = plan.day(key)?;
            let hit = day.title.to_lowercase().contains(&needle)
                || day
                    .tasks
                    .iter()
                    .any(|task| task.to_lowercase().contains(&needle));
            hit.then(|| SearchHit {
                week: key.week,
                day: key.day,
                title: day.title.clone(),
            })
        })
        .collect()
}
