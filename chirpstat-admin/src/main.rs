use chirpstat_db::client::{DbClient, DbError, DbSettings};
use clap::Parser;
use commands::{Cli, CommandError};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error connecting to the database: {0}")]
    Connect(DbError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    database_url: String,
    #[serde(default = "default_max_connections")]
    database_max_connections: u32,
    #[serde(default)]
    gmt_offset_hours: i32,
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chirpstat_admin=debug,\
                chirpstat_db=debug,\
                sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let cli = Cli::parse();
    let env = get_env()?;

    let settings = DbSettings {
        gmt_offset_hours: env.gmt_offset_hours,
    };
    let db = DbClient::connect(&env.database_url, env.database_max_connections, settings)
        .await
        .map_err(InitError::Connect)?;

    commands::run(&db, cli.command).await?;

    Ok(())
}
