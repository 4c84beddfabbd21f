use chirpstat_common::model::ModelValidationError;
use sqlx::{PgPool, migrate::MigrateError, postgres::PgPoolOptions};
use thiserror::Error;
use tracing::info;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Favoriter user id was not set")]
    MissingFavoriter,
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Running migrations failed: {0}")]
    Migrate(#[from] MigrateError),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct DbSettings {
    /// Hours subtracted from `pub_date` to produce the local publish time.
    pub gmt_offset_hours: i32,
}

#[derive(Clone, Debug)]
pub struct DbClient {
    pub(crate) pool: PgPool,
    pub(crate) settings: DbSettings,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, settings: DbSettings) -> Self {
        Self { pool, settings }
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        settings: DbSettings,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!(max_connections, "Connected to database");

        Ok(Self::new(pool, settings))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;

        info!("Database migrations applied");
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn settings(&self) -> DbSettings {
        self.settings
    }
}
