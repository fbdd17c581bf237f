//! HTTP service over the knowledge-graph retrieval core.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod routes;
pub mod service;

pub use config::AppConfig;
pub use error::ApiError;
pub use routes::router;
pub use service::GraphService;
