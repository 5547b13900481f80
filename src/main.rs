use livesync_director::{
    apiserver::create_api_router,
    config::Config,
    session::{DEFAULT_SESSION_TTL, SessionStore},
    start_backend,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let config = Config::from_env()?;
    let backend = start_backend(config.data_path.clone()).await?;

    let app = create_api_router(
        backend.cue_store,
        backend.director_tx,
        backend.sync,
        SessionStore::new(DEFAULT_SESSION_TTL),
        config.admin_password,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    log::info!("LiveSync Director listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
