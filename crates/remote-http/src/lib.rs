mod client;
mod config;
mod http;

pub use client::HttpTestManagement;
pub use config::HttpClientConfig;
pub use http::RESULTS_API_VERSION;
