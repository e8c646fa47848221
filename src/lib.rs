pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::Cli;
pub use crate::config::{toml_config::StackConfig, ServiceConfig};

#[cfg(feature = "s3")]
pub use crate::adapters::S3ModelStore;
pub use crate::adapters::{HealthProbe, LocalModelStore};
pub use crate::core::{router, serve, AppState, Plan, RequestMetrics};
pub use crate::utils::error::{ApiError, Result};
