// Adapters layer: concrete implementations for external systems (model storage, http probes)

pub mod probe;
pub mod store;

pub use probe::HealthProbe;
#[cfg(feature = "s3")]
pub use store::S3ModelStore;
pub use store::LocalModelStore;
