use async_trait::async_trait;
use std::error::Error;

/// Creates and destroys the resources held by a pool.
///
/// Resources are handed out by value and compared on release, so they are
/// usually cheap handles (`Arc`, ids, connection wrappers).
#[async_trait]
pub trait ResourceManager: Send + Sync + 'static {
    type Resource: Clone + Send + Sync + 'static;
    type Error: Error + Send + Sync + 'static;

    /// Open a new resource; a failure empties the reserved slot
    async fn create(&self) -> Result<Self::Resource, Self::Error>;

    /// Close an evicted resource; failures are collected, never raised
    async fn destroy(&self, resource: Self::Resource) -> Result<(), Self::Error>;
}
