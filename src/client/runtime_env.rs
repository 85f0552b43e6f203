//! Values injected into the process after build time.
//!
//! A deployment script writes a small JSON document (`{"API_URL": "..."}`); the host
//! loads it once and installs it as the process-global runtime environment.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path, sync::OnceLock};
use tracing::info;

use crate::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEnv {
    #[serde(rename = "API_URL", default)]
    pub api_url: Option<String>,
}

static RUNTIME_ENV: OnceLock<RuntimeEnv> = OnceLock::new();

/// Install the runtime environment. Only the first call takes effect; returns
/// whether this call was the one that installed it.
pub fn install(env: RuntimeEnv) -> bool {
    RUNTIME_ENV.set(env).is_ok()
}

/// The installed runtime environment, if any.
pub fn current() -> Option<&'static RuntimeEnv> {
    RUNTIME_ENV.get()
}

pub fn load_file(path: &Path) -> Result<RuntimeEnv, AppError> {
    let contents = fs::read_to_string(path)?;
    let env: RuntimeEnv = serde_json::from_str(&contents)?;
    Ok(env)
}

/// Load and install `path` when it exists. A missing file is not an error.
pub fn install_from_file(path: &Path) -> Result<bool, AppError> {
    if !path.is_file() {
        info!(path = %path.display(), "runtime env file not found; skipping");
        return Ok(false);
    }
    let env = load_file(path)?;
    info!(path = %path.display(), api_url = ?env.api_url, "runtime env loaded");
    Ok(install(env))
}
