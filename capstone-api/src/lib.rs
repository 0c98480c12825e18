//! HTTP client for the capstone repository service.
//!
//! Public API: [`CapstoneClient`], configured from [`ApiConfig`]. Search and
//! summary-job endpoints live in `client`, the ordinary CRUD and login
//! resources in `resources`. Every call returns [`ApiResult`].

mod client;
mod config;
mod errors;
mod resources;

pub mod types;

pub use client::CapstoneClient;
pub use config::{ApiConfig, DEFAULT_TIMEOUT_SECS};
pub use errors::{
    ApiResult, CapstoneApiError, ConfigError, env_opt_u64, make_snippet, must_env, opt_env,
    validate_http_endpoint,
};
pub use types::{SearchHit, SearchResponse, SummaryPayload, SummaryReference, SummaryStatus};
