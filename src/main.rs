mod app;
mod auth;
mod cli;
mod config;
mod error;
mod state;
mod users;

use clap::Parser;

use crate::{
    cli::{Cli, Commands},
    config::AppConfig,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "authgate=debug,axum=info,tower_http=info".to_string());
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

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(config).await?;

    match cli.command {
        Some(Commands::User(cmd)) => {
            let out = cmd.execute(app_state.users.as_ref()).await?;
            println!("{out}");
            Ok(())
        }
        Some(Commands::Serve) | None => {
            let config = app_state.config.clone();
            let app = app::build_app(app_state);
            app::serve(app, &config).await
        }
    }
}
