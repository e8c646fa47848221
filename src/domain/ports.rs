use crate::utils::error::Result;
use async_trait::async_trait;

/// Where model artifacts live. Readiness is derived from [`ModelStore::check_ready`].
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Human readable location, e.g. `s3://bucket` or a directory path.
    fn describe(&self) -> String;

    async fn check_ready(&self) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn model_bucket(&self) -> &str;
    fn region(&self) -> &str;
    fn port(&self) -> u16;
}
