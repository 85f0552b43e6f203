//! Database module: startup provisioning and the shared connection handle.
//!
//! Layout:
//! - `bootstrap.rs`: the ordered connect / create / switch / create-table sequence
//! - `connection.rs`: the `Database` handle and the MySQL connector
//! - `identifier.rs`: allow-list validation for the interpolated database name
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for the provisioned database
//! - `users.rs`: minimal data access on the `users` table

pub mod bootstrap;
pub mod connection;
pub mod identifier;
pub mod models;
pub mod schema;
pub mod users;

pub use bootstrap::{Connector, Session, bootstrap, run};
pub use connection::{ConnectionInfo, Database, DbSettings, MySqlConnector};
pub use identifier::DatabaseName;
pub use models::{NewUser, User};
pub use schema::USERS_TABLE;
pub use users::UsersStore;
