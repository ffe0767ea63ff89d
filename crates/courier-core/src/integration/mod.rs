//! Integration layer - the service registry boundary and the wrapper cache.

pub mod cache;
pub mod registry;

pub use cache::WrapperCache;
pub use registry::{Registry, ServiceArc, ServiceRegistry, ServiceRegistryExt};
