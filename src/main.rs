use biblioteca::{
    app, db,
    state::{AppState, Bootstrap},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "biblioteca=debug,axum=info,tower_http=info,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let Bootstrap { state, pool } = AppState::init()?;

    // Refuse to serve without a reachable database.
    if let Err(e) = state.db.authenticate().await {
        tracing::error!(error = %format!("{e:#}"), "database unreachable; server will not start");
        return Err(e);
    }
    tracing::info!(database = %state.config.database.name, "database connection established");

    db::ensure_schema(&pool).await?;

    let host = state.config.host.clone();
    let port = state.config.port;
    app::serve(app::build_app(state), &host, port).await
}
