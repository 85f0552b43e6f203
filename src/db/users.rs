use super::connection::Database;
use super::models::{NewUser, User};
use crate::error::AppError;

/// Data access for the `users` table over the shared connection.
#[derive(Clone)]
pub struct UsersStore {
    db: Database,
}

impl UsersStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a user and return its id. A second insert with the same email is
    /// rejected by the unique index and reported as `DuplicateEmail`.
    pub async fn create(&self, user: NewUser) -> Result<u64, AppError> {
        let mut conn = self.db.acquire().await;
        let result = match user.role.as_deref() {
            Some(role) => {
                sqlx::query("INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)")
                    .bind(&user.name)
                    .bind(&user.email)
                    .bind(&user.password)
                    .bind(role)
                    .execute(&mut *conn)
                    .await
            }
            None => {
                sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
                    .bind(&user.name)
                    .bind(&user.email)
                    .bind(&user.password)
                    .execute(&mut *conn)
                    .await
            }
        };

        match result {
            Ok(done) => Ok(done.last_insert_id()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::DuplicateEmail(user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let mut conn = self.db.acquire().await;
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, password, role, created_at
               FROM users WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(user)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let mut conn = self.db.acquire().await;
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *conn)
            .await?;
        Ok(rec.0)
    }
}
