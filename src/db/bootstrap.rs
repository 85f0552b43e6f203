use std::future::Future;

use tracing::{error, info};

use super::connection::{ConnectionInfo, Database, DbSettings, MySqlConnector};
use super::identifier::DatabaseName;
use super::schema;
use crate::error::BootstrapError;

/// Opens a server-level session (no database selected).
pub trait Connector {
    type Session: Session;

    fn connect(
        &self,
        settings: &DbSettings,
    ) -> impl Future<Output = Result<Self::Session, sqlx::Error>> + Send;
}

/// The two session capabilities the startup sequence relies on.
///
/// The sequence is awaited inline at startup, so the returned futures carry no `Send` bound.
pub trait Session: Send {
    /// Run one or more statements over the text protocol.
    fn execute_script(&mut self, sql: &str) -> impl Future<Output = Result<(), sqlx::Error>>;

    /// Make `name` the active database for the rest of the session.
    fn use_database(&mut self, name: &DatabaseName)
    -> impl Future<Output = Result<(), sqlx::Error>>;
}

/// Bring the server from an unknown state to one where the configured database
/// and the `users` table exist, returning the session with that database selected.
///
/// Steps run strictly in order; the first failure is returned and nothing after
/// it is attempted. Work done by earlier steps is left in place.
pub async fn run<C: Connector>(
    connector: &C,
    settings: &DbSettings,
) -> Result<C::Session, BootstrapError> {
    let mut session = connector
        .connect(settings)
        .await
        .map_err(BootstrapError::Connect)
        .inspect_err(log_failure)?;
    info!(host = %settings.host_or_default(), port = settings.port, "MySQL connected");

    let name = DatabaseName::parse(settings.name.as_deref().unwrap_or_default())
        .inspect_err(log_failure)?;

    session
        .execute_script(&schema::create_database(&name))
        .await
        .map_err(|source| BootstrapError::CreateDatabase {
            name: name.to_string(),
            source,
        })
        .inspect_err(log_failure)?;
    info!("database '{}' is ready", name);

    session
        .use_database(&name)
        .await
        .map_err(|source| BootstrapError::SwitchDatabase {
            name: name.to_string(),
            source,
        })
        .inspect_err(log_failure)?;
    info!("switched to database '{}'", name);

    session
        .execute_script(schema::USERS_TABLE)
        .await
        .map_err(BootstrapError::CreateTable)
        .inspect_err(log_failure)?;
    info!("users table ensured");

    Ok(session)
}

/// Run the startup sequence against MySQL and wrap the result as the shared handle.
pub async fn bootstrap(settings: &DbSettings) -> Result<Database, BootstrapError> {
    let conn = run(&MySqlConnector, settings).await?;
    let info = ConnectionInfo {
        host: settings.host_or_default().to_string(),
        port: settings.port,
        user: settings.user.clone(),
        database: settings.name.clone().unwrap_or_default(),
        multi_statements: true,
    };
    Ok(Database::new(conn, info))
}

fn log_failure(err: &BootstrapError) {
    error!(kind = ?err.kind(), "{}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BootstrapErrorKind;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Script(String),
        Use(String),
    }

    #[derive(Debug, Default, Clone, Copy)]
    struct Failures {
        connect: bool,
        create_database: bool,
        switch: bool,
        create_table: bool,
    }

    fn refused() -> sqlx::Error {
        sqlx::Error::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
    }

    #[derive(Default)]
    struct FakeConnector {
        fail: Failures,
        log: Arc<Mutex<Vec<Call>>>,
    }

    #[derive(Debug)]
    struct FakeSession {
        fail: Failures,
        log: Arc<Mutex<Vec<Call>>>,
    }

    impl Connector for FakeConnector {
        type Session = FakeSession;

        async fn connect(&self, _settings: &DbSettings) -> Result<FakeSession, sqlx::Error> {
            if self.fail.connect {
                return Err(refused());
            }
            Ok(FakeSession {
                fail: self.fail,
                log: self.log.clone(),
            })
        }
    }

    impl Session for FakeSession {
        async fn execute_script(&mut self, sql: &str) -> Result<(), sqlx::Error> {
            let is_table = sql.contains("CREATE TABLE");
            self.log.lock().unwrap().push(Call::Script(sql.to_string()));
            if (is_table && self.fail.create_table) || (!is_table && self.fail.create_database) {
                return Err(sqlx::Error::Protocol("statement rejected".into()));
            }
            Ok(())
        }

        async fn use_database(&mut self, name: &DatabaseName) -> Result<(), sqlx::Error> {
            self.log.lock().unwrap().push(Call::Use(name.to_string()));
            if self.fail.switch {
                return Err(sqlx::Error::Protocol("unknown database".into()));
            }
            Ok(())
        }
    }

    fn settings(name: &str) -> DbSettings {
        DbSettings {
            host: Some("db".into()),
            port: 3306,
            user: Some("admin".into()),
            password: Some("secret".into()),
            name: Some(name.into()),
        }
    }

    fn calls(connector: &FakeConnector) -> Vec<Call> {
        connector.log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn steps_run_in_order() {
        let connector = FakeConnector::default();
        run(&connector, &settings("portal")).await.unwrap();

        assert_eq!(
            calls(&connector),
            vec![
                Call::Script("CREATE DATABASE IF NOT EXISTS `portal`".into()),
                Call::Use("portal".into()),
                Call::Script(schema::USERS_TABLE.into()),
            ]
        );
    }

    #[derive(Clone, Default)]
    struct LogBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn each_step_boundary_is_logged() {
        let buf = LogBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        run(&FakeConnector::default(), &settings("portal"))
            .await
            .unwrap();

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let expected = [
            "MySQL connected",
            "database 'portal' is ready",
            "switched to database 'portal'",
            "users table ensured",
        ];
        let mut last = 0;
        for line in expected {
            let at = out[last..]
                .find(line)
                .unwrap_or_else(|| panic!("missing log {line:?} in:\n{out}"));
            last += at + line.len();
        }
    }

    #[tokio::test]
    async fn switch_failure_is_not_logged_as_success() {
        let buf = LogBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let connector = FakeConnector {
            fail: Failures {
                switch: true,
                ..Default::default()
            },
            ..Default::default()
        };
        run(&connector, &settings("portal")).await.unwrap_err();

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(!out.contains("switched to database"));
        assert!(out.contains("ERROR"));
    }

    #[tokio::test]
    async fn repeated_runs_issue_the_same_idempotent_statements() {
        let connector = FakeConnector::default();
        run(&connector, &settings("portal")).await.unwrap();
        run(&connector, &settings("portal")).await.unwrap();

        let log = calls(&connector);
        assert_eq!(log.len(), 6);
        assert_eq!(log[..3], log[3..]);
    }

    #[tokio::test]
    async fn connect_failure_issues_no_statements() {
        let connector = FakeConnector {
            fail: Failures {
                connect: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = run(&connector, &settings("portal")).await.err().unwrap();

        assert_eq!(err.kind(), BootstrapErrorKind::Connection);
        assert!(calls(&connector).is_empty());
    }

    #[tokio::test]
    async fn invalid_name_stops_before_any_statement() {
        let connector = FakeConnector::default();
        let err = run(&connector, &settings("app`; DROP TABLE users; --"))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, BootstrapError::InvalidDatabaseName(_)));
        assert!(calls(&connector).is_empty());
    }

    #[tokio::test]
    async fn missing_name_is_a_provisioning_failure() {
        let connector = FakeConnector::default();
        let mut s = settings("unused");
        s.name = None;
        let err = run(&connector, &s).await.err().unwrap();

        assert_eq!(err.kind(), BootstrapErrorKind::Provisioning);
        assert!(calls(&connector).is_empty());
    }

    #[tokio::test]
    async fn create_database_failure_skips_switch_and_table() {
        let connector = FakeConnector {
            fail: Failures {
                create_database: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = run(&connector, &settings("portal")).await.err().unwrap();

        assert!(matches!(err, BootstrapError::CreateDatabase { .. }));
        assert_eq!(calls(&connector).len(), 1);
    }

    #[tokio::test]
    async fn switch_failure_skips_table_creation() {
        let connector = FakeConnector {
            fail: Failures {
                switch: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = run(&connector, &settings("portal")).await.err().unwrap();

        assert_eq!(err.kind(), BootstrapErrorKind::Switch);
        let log = calls(&connector);
        assert_eq!(log.len(), 2);
        assert!(
            !log.iter()
                .any(|c| matches!(c, Call::Script(s) if s.contains("CREATE TABLE")))
        );
    }

    #[tokio::test]
    async fn table_failure_is_reported() {
        let connector = FakeConnector {
            fail: Failures {
                create_table: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = run(&connector, &settings("portal")).await.err().unwrap();

        assert!(matches!(err, BootstrapError::CreateTable(_)));
        assert_eq!(calls(&connector).len(), 3);
    }
}
