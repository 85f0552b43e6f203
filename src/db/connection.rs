use std::fmt;
use std::sync::Arc;

use sqlx::Connection;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use super::bootstrap::{Connector, Session};
use super::identifier::DatabaseName;
use super::schema;
use super::users::UsersStore;
use crate::error::AppError;

const DEFAULT_HOST: &str = "localhost";

/// Connection parameters for the startup sequence, all sourced from `DB_*` env vars.
#[derive(Clone, Default)]
pub struct DbSettings {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .finish()
    }
}

impl DbSettings {
    pub fn host_or_default(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Server-level options; no database is selected at connect time.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut opts = MySqlConnectOptions::new()
            .host(self.host_or_default())
            .port(self.port);
        if let Some(user) = self.user.as_deref() {
            opts = opts.username(user);
        }
        if let Some(password) = self.password.as_deref() {
            opts = opts.password(password);
        }
        opts
    }
}

/// Attributes of the live session. The password is intentionally absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub database: String,
    /// Scripts go over the text protocol, so one call may carry several statements.
    pub multi_statements: bool,
}

/// Opens a single MySQL session with no default schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl Connector for MySqlConnector {
    type Session = MySqlConnection;

    async fn connect(&self, settings: &DbSettings) -> Result<MySqlConnection, sqlx::Error> {
        MySqlConnection::connect_with(&settings.connect_options()).await
    }
}

impl Session for MySqlConnection {
    async fn execute_script(&mut self, sql: &str) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(sql).execute(&mut *self).await?;
        Ok(())
    }

    async fn use_database(&mut self, name: &DatabaseName) -> Result<(), sqlx::Error> {
        // USE is not accepted by the prepared-statement protocol.
        let stmt = schema::use_database(name);
        sqlx::raw_sql(&stmt).execute(&mut *self).await?;
        Ok(())
    }
}

/// Process-wide handle to the provisioned database.
///
/// Clones share one session; callers serialize through [`Database::acquire`].
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<MySqlConnection>>,
    info: Arc<ConnectionInfo>,
}

impl Database {
    pub fn new(conn: MySqlConnection, info: ConnectionInfo) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            info: Arc::new(info),
        }
    }

    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    pub async fn acquire(&self) -> MutexGuard<'_, MySqlConnection> {
        self.conn.lock().await
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.acquire().await.ping().await?;
        Ok(())
    }

    pub fn users(&self) -> UsersStore {
        UsersStore::new(self.clone())
    }

    /// Gracefully terminate the session. Only succeeds for the last live clone;
    /// otherwise the session is left to be dropped with the remaining clones.
    pub async fn close(self) -> Result<(), AppError> {
        match Arc::try_unwrap(self.conn) {
            Ok(conn) => {
                conn.into_inner().close().await?;
                info!(database = %self.info.database, "MySQL connection closed");
            }
            Err(_) => {
                warn!(
                    database = %self.info.database,
                    "database handle still shared at shutdown; skipping graceful close"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let settings = DbSettings {
            host: Some("db".into()),
            port: 3306,
            user: Some("admin".into()),
            password: Some("hunter2".into()),
            name: Some("app".into()),
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn missing_host_falls_back_to_localhost() {
        let settings = DbSettings {
            port: 3306,
            ..Default::default()
        };
        assert_eq!(settings.host_or_default(), "localhost");
    }
}
