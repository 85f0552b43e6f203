pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod router;

pub use client::{API_CLIENT, ApiClient};
pub use db::{Database, bootstrap};
pub use error::{AppError, BootstrapError};
