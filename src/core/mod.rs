pub mod metrics;
pub mod server;
pub mod topology;

pub use crate::domain::model::{HealthResponse, MetricsSnapshot, ReadinessResponse};
pub use crate::domain::ports::{ConfigProvider, ModelStore};
pub use crate::utils::error::Result;
pub use metrics::RequestMetrics;
pub use server::{router, serve, AppState};
pub use topology::{Plan, Resource, ResourceKind, StackOutput};
