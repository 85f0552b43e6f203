use tracing::{debug, warn};
use url::Url;

use super::runtime_env::{self, RuntimeEnv};

pub const FALLBACK_BASE_URL: &str = "http://localhost:5000";

/// Compile-time override, forwarded by `build.rs`.
pub const BUILD_TIME_BASE_URL: Option<&str> = option_env!("APP_API_URL");

/// One layer of base-address configuration.
pub trait BaseUrlSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw value from this layer, evaluated only when every earlier layer came up empty.
    fn lookup(&self) -> Option<String>;
}

/// Value injected into the running process (`API_URL` of the runtime env).
///
/// `RuntimeInjected::global()` reads the installed env at lookup time;
/// `RuntimeInjected::with(..)` pins a specific one.
#[derive(Debug, Clone, Default)]
pub struct RuntimeInjected {
    env: Option<RuntimeEnv>,
}

impl RuntimeInjected {
    pub fn global() -> Self {
        Self { env: None }
    }

    pub fn with(env: RuntimeEnv) -> Self {
        Self { env: Some(env) }
    }
}

impl BaseUrlSource for RuntimeInjected {
    fn name(&self) -> &'static str {
        "runtime"
    }

    fn lookup(&self) -> Option<String> {
        match &self.env {
            Some(env) => env.api_url.clone(),
            None => runtime_env::current().and_then(|env| env.api_url.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildTime(pub Option<&'static str>);

impl Default for BuildTime {
    fn default() -> Self {
        Self(BUILD_TIME_BASE_URL)
    }
}

impl BaseUrlSource for BuildTime {
    fn name(&self) -> &'static str {
        "build"
    }

    fn lookup(&self) -> Option<String> {
        self.0.map(str::to_string)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Fallback(pub &'static str);

impl Default for Fallback {
    fn default() -> Self {
        Self(FALLBACK_BASE_URL)
    }
}

impl BaseUrlSource for Fallback {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn lookup(&self) -> Option<String> {
        Some(self.0.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBaseUrl {
    pub source: &'static str,
    pub url: Url,
}

/// Runtime injection, then the build-time constant, then the local fallback.
pub fn default_sources() -> Vec<Box<dyn BaseUrlSource>> {
    vec![
        Box::new(RuntimeInjected::global()),
        Box::new(BuildTime::default()),
        Box::new(Fallback::default()),
    ]
}

/// Walk `sources` in order and return the first non-empty value that parses as a URL.
/// Later sources are never consulted once one matches.
pub fn resolve<S>(sources: &[S]) -> Option<ResolvedBaseUrl>
where
    S: AsRef<dyn BaseUrlSource>,
{
    sources.iter().map(AsRef::as_ref).find_map(|source| {
        let raw = source.lookup()?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match Url::parse(raw) {
            Ok(url) => {
                debug!(source = source.name(), url = %url, "base URL resolved");
                Some(ResolvedBaseUrl {
                    source: source.name(),
                    url,
                })
            }
            Err(e) => {
                warn!(
                    source = source.name(),
                    value = raw,
                    error = %e,
                    "ignoring unparseable base URL"
                );
                None
            }
        }
    })
}
