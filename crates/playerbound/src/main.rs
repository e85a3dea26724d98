use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playerbound::services::{LoginService, RegistrationService};
use playerbound::{AppState, Config, RequestScope};

/// Playerbound - register and log in players against the configured stores
#[derive(Parser, Debug)]
#[command(name = "playerbound")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Cache key namespace
    #[arg(long, env = "APP_ENVIRONMENT")]
    environment: Option<String>,

    /// Path to the SQLite database
    #[arg(long, env = "SQLITE_PATH")]
    sqlite_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new player
    Register {
        #[arg(long)]
        device_id: String,
        #[arg(long)]
        uid: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Log a player in and print the new session
    Login {
        #[arg(long)]
        player_id: i64,
        #[arg(long)]
        device_id: String,
        #[arg(long)]
        uid: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playerbound=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }
    if let Some(sqlite_path) = cli.sqlite_path {
        config.sqlite_path = sqlite_path;
    }

    let state = AppState::new(&config).await?;
    let scope = RequestScope::open(&state).await?;
    let transaction = scope.begin_transaction().await?;
    let now = Utc::now();

    let output = match cli.command {
        Command::Register {
            device_id,
            uid,
            name,
        } => {
            let player_id = RegistrationService::new(&scope)
                .register(&device_id, &uid, &name, now)
                .await;
            player_id.map(|player_id| serde_json::json!({ "player_id": player_id }))
        }
        Command::Login {
            player_id,
            device_id,
            uid,
        } => LoginService::new(&scope)
            .login(player_id, &device_id, &uid, now)
            .await
            .map(|session| serde_json::json!(session)),
    };

    let result = match output {
        Ok(output) => transaction
            .commit()
            .await
            .map(|()| output)
            .map_err(anyhow::Error::from),
        Err(e) => {
            tracing::warn!(code = e.error_code().code(), error = %e, "Request failed");
            Err(e.into())
        }
    };
    scope.dispose().await?;
    let output = result?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
