use crate::errors::AppError;
use crate::models::PersistedState;
use crate::plan::StudyPlan;
use crate::store::{ProgressStore, STATE_KEY};
use std::{path::Path, sync::Arc};
use tokio::fs;
use tracing::{error, info};

pub async fn load_store(path: &Path, plan: Arc<StudyPlan>) -> ProgressStore {
    let mut store = ProgressStore::new(plan);
    match fs::read_to_string(path).await {
        Ok(raw) => {
            store.restore(&raw);
            info!(
                "restored {STATE_KEY} from {}: {} tasks completed",
                path.display(),
                store.completed_count()
            );
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("no saved {STATE_KEY} at {}, starting fresh", path.display());
        }
        Err(err) => {
            error!("failed to read data file: {err}");
        }
    }
    store
}

pub async fn persist_state(path: &Path, state: &PersistedState) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(state).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
