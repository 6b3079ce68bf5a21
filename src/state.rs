use crate::{
    config::RuntimeConfiguration,
    error::{AcademyResult, GetDatabaseConnectionSnafu, MigrateSnafu, OpenDatabaseSnafu},
    flash::Flash,
    maud_conveniences::render_nav,
};
use maud::{DOCTYPE, Markup, html};
use snafu::ResultExt;
use sqlx::{
    Pool, Sqlite, Transaction,
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, time::Duration};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct AcademyState {
    pool: Pool<Sqlite>,
    config: RuntimeConfiguration,
}

impl AcademyState {
    pub async fn new(
        options: SqlitePoolOptions,
        config: RuntimeConfiguration,
    ) -> AcademyResult<Self> {
        let connect_options = SqliteConnectOptions::from_str(config.db_config().get_db_url())
            .context(OpenDatabaseSnafu)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = options
            .connect_with(connect_options)
            .await
            .context(OpenDatabaseSnafu)?;

        Self::from_pool(pool, config).await
    }

    async fn from_pool(pool: Pool<Sqlite>, config: RuntimeConfiguration) -> AcademyResult<Self> {
        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        Ok(Self { pool, config })
    }

    #[allow(clippy::unused_self)] //in case self is ever needed :)
    pub fn render(&self, flash: Option<&Flash>, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Academy" }
                }
                body class="bg-gray-900 min-h-screen flex flex-col items-center text-white p-8 space-y-4" {
                    (render_nav())
                    @if let Some(flash) = flash {
                        (flash)
                    }
                    (markup)
                }
            }
        }
    }

    pub async fn get_connection(&self) -> AcademyResult<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .context(GetDatabaseConnectionSnafu)
    }

    /// Takes the sqlite write lock up front. Concurrent writers wait on the busy timeout.
    pub async fn get_transaction(&self) -> AcademyResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context(GetDatabaseConnectionSnafu)
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub async fn sensible_shutdown(&self) {
        self.pool.close().await;
    }

    /// A fresh, migrated in-memory database. The pool holds exactly one connection that never
    /// expires, since every sqlite `:memory:` connection is its own database.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("valid sqlite url")
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .expect("unable to open in-memory database");
        let config = RuntimeConfiguration::new().expect("unable to create config");

        Self::from_pool(pool, config)
            .await
            .expect("unable to migrate in-memory database")
    }

    /// A migrated database file shared by several pooled connections, for tests that need
    /// writers to actually contend.
    #[cfg(test)]
    pub async fn on_disk(path: &std::path::Path) -> Self {
        let connect_options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(connect_options)
            .await
            .expect("unable to open database file");
        let config = RuntimeConfiguration::new().expect("unable to create config");

        Self::from_pool(pool, config)
            .await
            .expect("unable to migrate database file")
    }
}
