use std::{net::SocketAddr, sync::Arc};
use study_plan::{load_store, router, AppState, Config, StudyPlan};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;

    let plan = match &config.plan_path {
        Some(path) => {
            info!("loading study plan from {}", path.display());
            StudyPlan::load(path)?
        }
        None => StudyPlan::default_plan(),
    };
    let plan = Arc::new(plan);

    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store = load_store(&config.data_path, plan).await;
    let chat = config.chat_client();
    if chat.is_none() {
        info!("chat API not configured; the assistant will answer with an apology");
    }

    let state = AppState::new(
        config.data_path.clone(),
        store,
        config.edition.features(),
        chat,
    );
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        "listening on http://{addr} (edition: {}, data: {})",
        config.edition.as_str(),
        config.data_path.display()
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
