use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    env,
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
    sync::LazyLock,
};

use crate::db::DbSettings;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server listen address (e.g., "0.0.0.0", "127.0.0.1").
    /// Env: `LISTEN_ADDR`. Default: `0.0.0.0`.
    #[serde(default = "default_listen_ip")]
    pub listen_addr: IpAddr,

    /// HTTP server listen port.
    /// Env: `LISTEN_PORT`. Default: `5000`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// Env: `LOGLEVEL`. Default: `info`.
    #[serde(default)]
    pub loglevel: String,

    /// MySQL server host. Env: `DB_HOST`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub db_host: Option<String>,

    /// MySQL server port. Env: `DB_PORT`. Default: `3306`.
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Env: `DB_USER`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub db_user: Option<String>,

    /// Env: `DB_PASSWORD`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub db_password: Option<String>,

    /// Database to provision and select at startup. Env: `DB_NAME`.
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    pub db_name: Option<String>,

    /// JSON file written by the deployment environment script, carrying `API_URL`.
    /// Env: `RUNTIME_ENV_FILE`. Default: `env-config.json`.
    #[serde(default)]
    pub runtime_env_file: PathBuf,

    /// Client-side key/value storage holding the auth token.
    /// Env: `TOKEN_FILE`. Default: `local-storage.json`.
    #[serde(default)]
    pub token_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_ip(),
            listen_port: default_listen_port(),
            loglevel: "info".to_string(),
            db_host: None,
            db_port: default_db_port(),
            db_user: None,
            db_password: None,
            db_name: None,
            runtime_env_file: PathBuf::from("env-config.json"),
            token_file: PathBuf::from("local-storage.json"),
        }
    }
}

/// Credential-like variables kept byte-for-byte (`007` must not become `7`).
const VERBATIM_ENV_KEYS: [(&str, &str); 4] = [
    ("DB_HOST", "db_host"),
    ("DB_USER", "db_user"),
    ("DB_PASSWORD", "db_password"),
    ("DB_NAME", "db_name"),
];

impl Config {
    /// Builds a Figment that merges defaults and environment variables.
    /// Uses raw env mapping, so field names map to env vars in UPPER_SNAKE_CASE.
    /// `Env` parses values as TOML-like literals, so the `DB_*` strings are merged
    /// again on top exactly as they appear in the environment.
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Env::raw())
            .merge(Serialized::defaults(verbatim_env()))
    }

    /// Loads configuration from the environment (with defaults).
    ///
    /// Database settings are deliberately not checked here; a missing host or name
    /// surfaces as a bootstrap failure.
    pub fn from_env() -> Self {
        Self::figment()
            .extract()
            .expect("failed to extract configuration via Figment")
    }

    pub fn db_settings(&self) -> DbSettings {
        DbSettings {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            name: self.db_name.clone(),
        }
    }
}

fn verbatim_env() -> BTreeMap<&'static str, String> {
    VERBATIM_ENV_KEYS
        .into_iter()
        .filter_map(|(var, field)| env::var(var).ok().map(|v| (field, v)))
        .collect()
}

fn deserialize_opt_string_lax<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;

    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(serde::de::Error::custom(
            "expected a string or a number for database settings",
        )),
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_env);

/// Default IP address for the HTTP server listen address.
pub fn default_listen_ip() -> IpAddr {
    Ipv4Addr::new(0, 0, 0, 0).into()
}

/// Default port for the HTTP server.
pub fn default_listen_port() -> u16 {
    5000
}

pub fn default_db_port() -> u16 {
    3306
}
