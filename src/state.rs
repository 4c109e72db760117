use crate::chat::ChatClient;
use crate::config::Features;
use crate::store::ProgressStore;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub store: Arc<Mutex<ProgressStore>>,
    pub features: Features,
    pub chat: Option<ChatClient>,
}

impl AppState {
    pub fn new(
        data_path: PathBuf,
        store: ProgressStore,
        features: Features,
        chat: Option<ChatClient>,
    ) -> Self {
        Self {
            data_path,
            store: Arc::new(Mutex::new(store)),
            features,
            chat,
        }
    }
}
