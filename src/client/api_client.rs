use headers::{Authorization, HeaderMapExt};
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::warn;
use url::Url;

use super::base_url::{self, BaseUrlSource, ResolvedBaseUrl};
use super::storage::{FileStorage, TOKEN_KEY, TokenStore};
use crate::config::{CONFIG, Config};
use crate::error::AppError;

/// Insert `Authorization: Bearer <token>` when a usable token is present.
///
/// Absent or empty tokens leave `headers` untouched, and so does a token that
/// cannot be carried in a header value; the request goes out unauthenticated.
pub fn attach_bearer(headers: &mut HeaderMap, token: Option<&str>) {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return;
    };
    match Authorization::bearer(token) {
        Ok(auth) => headers.typed_insert(auth),
        Err(_) => warn!("stored token is not a valid header value; sending without Authorization"),
    }
}

/// `scheme://...`, where scheme is `[A-Za-z][A-Za-z0-9+.-]*`. A bare `user:42` is a path.
fn has_scheme_authority(path: &str) -> bool {
    let Some((scheme, rest)) = path.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    rest.starts_with("//")
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Request dispatcher with a fixed base address and per-request token injection.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: ResolvedBaseUrl,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base: ResolvedBaseUrl, store: Arc<dyn TokenStore>) -> Self {
        Self { http, base, store }
    }

    pub fn from_sources<S>(
        http: reqwest::Client,
        sources: &[S],
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, AppError>
    where
        S: AsRef<dyn BaseUrlSource>,
    {
        let base = base_url::resolve(sources).ok_or(AppError::NoBaseUrl)?;
        Ok(Self::new(http, base, store))
    }

    /// Client wired to the default source chain and the configured token file.
    pub fn from_config(cfg: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("userhub/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()?;
        let store = Arc::new(FileStorage::new(cfg.token_file.clone()));
        Self::from_sources(http, &base_url::default_sources(), store)
    }

    pub fn base_url(&self) -> &Url {
        &self.base.url
    }

    /// Which layer the base address came from.
    pub fn base_source(&self) -> &'static str {
        self.base.source
    }

    fn join(&self, path: &str) -> String {
        if path.starts_with("//") {
            return format!("{}:{}", self.base.url.scheme(), path);
        }
        if has_scheme_authority(path) {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base.url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Absolute URL for `path`. Only `scheme://` inputs bypass the base; `//host`
    /// inherits the base scheme.
    pub fn url(&self, path: &str) -> Result<Url, AppError> {
        Ok(Url::parse(&self.join(path))?)
    }

    /// Start a request. Storage is consulted here, once per call.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut headers = HeaderMap::new();
        attach_bearer(&mut headers, self.store.get_item(TOKEN_KEY).as_deref());
        self.http.request(method, self.join(path)).headers(headers)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.request(Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Build without sending; useful for inspecting the outgoing request.
    pub fn build(&self, method: Method, path: &str) -> Result<reqwest::Request, AppError> {
        Ok(self.request(method, path).build()?)
    }
}

/// Global, lazily-initialized API client.
pub static API_CLIENT: LazyLock<ApiClient> = LazyLock::new(|| {
    ApiClient::from_config(&CONFIG).expect("FATAL: initialize API client failed")
});

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    #[test]
    fn bearer_attached_for_present_token() {
        let mut headers = HeaderMap::new();
        attach_bearer(&mut headers, Some("abc123"));
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");
    }

    #[test]
    fn absent_or_empty_token_adds_nothing() {
        let mut headers = HeaderMap::new();
        attach_bearer(&mut headers, None);
        attach_bearer(&mut headers, Some(""));
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn only_scheme_and_authority_mark_absolute() {
        assert!(has_scheme_authority("https://api.example.com/x"));
        assert!(has_scheme_authority("git+ssh://host/repo"));
        assert!(!has_scheme_authority("user:42"));
        assert!(!has_scheme_authority("localhost:5000/users"));
        assert!(!has_scheme_authority("1http://x"));
        assert!(!has_scheme_authority("/users"));
    }

    #[test]
    fn invalid_token_is_skipped_not_fatal() {
        let mut headers = HeaderMap::new();
        attach_bearer(&mut headers, Some("line\nbreak"));
        assert!(headers.get(AUTHORIZATION).is_none());
    }
}
