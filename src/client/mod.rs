//! Outgoing HTTP client: layered base-address resolution plus bearer-token injection.

pub mod api_client;
pub mod base_url;
pub mod runtime_env;
pub mod storage;

pub use api_client::{API_CLIENT, ApiClient, attach_bearer};
pub use base_url::{
    BaseUrlSource, BuildTime, FALLBACK_BASE_URL, Fallback, ResolvedBaseUrl, RuntimeInjected,
    default_sources, resolve,
};
pub use runtime_env::RuntimeEnv;
pub use storage::{FileStorage, MemoryStorage, TOKEN_KEY, TokenStore};
