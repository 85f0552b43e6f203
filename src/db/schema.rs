//! SQL DDL for the provisioned database.
//! MySQL dialect; every statement is idempotent so it can run on every start.

use super::identifier::DatabaseName;

/// `users` table:
/// - `id` INT AUTO_INCREMENT PRIMARY KEY
/// - `email` UNIQUE, enforced by the storage engine
/// - `password` holds an already-hashed value
/// - `role` defaults to `user`, `created_at` to the insert time
pub const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INT AUTO_INCREMENT PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(100) UNIQUE NOT NULL,
    password VARCHAR(255) NOT NULL,
    role VARCHAR(20) DEFAULT 'user',
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

pub fn create_database(name: &DatabaseName) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", name.quoted())
}

pub fn use_database(name: &DatabaseName) -> String {
    format!("USE {}", name.quoted())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_quote_the_name() {
        let name = DatabaseName::parse("portal").unwrap();
        assert_eq!(
            create_database(&name),
            "CREATE DATABASE IF NOT EXISTS `portal`"
        );
        assert_eq!(use_database(&name), "USE `portal`");
    }

    #[test]
    fn users_table_is_idempotent_and_unique_on_email() {
        assert!(USERS_TABLE.contains("CREATE TABLE IF NOT EXISTS users"));
        assert!(USERS_TABLE.contains("email VARCHAR(100) UNIQUE NOT NULL"));
        assert!(USERS_TABLE.contains("role VARCHAR(20) DEFAULT 'user'"));
    }
}
