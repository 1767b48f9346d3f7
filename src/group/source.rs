//! Backing Store Contracts
//!
//! The miss path (`Loader`) and the write-through path (`WriteBack`) a group
//! talks to, plus closure adapters.

use std::future::Future;

use async_trait::async_trait;

use crate::error::Result;

// == Loader ==
/// Loads a value from the backing store on a cache miss.
///
/// Should return `CacheError::KeyNotFound` for keys the store does not have.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    async fn load(&self, key: &str) -> Result<Vec<u8>>;
}

// == Write Back ==
/// Persists an explicit write before the cache is updated.
#[async_trait]
pub trait WriteBack: Send + Sync + 'static {
    async fn store(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Adapts an async closure into a [`Loader`].
pub struct LoaderFn<F>(pub F);

#[async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        (self.0)(key.to_string()).await
    }
}

/// Adapts an async closure into a [`WriteBack`].
pub struct WriteBackFn<F>(pub F);

#[async_trait]
impl<F, Fut> WriteBack for WriteBackFn<F>
where
    F: Fn(String, Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        (self.0)(key.to_string(), value.to_vec()).await
    }
}

/// Write-back that accepts every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWriteBack;

#[async_trait]
impl WriteBack for NoWriteBack {
    async fn store(&self, _key: &str, _value: &[u8]) -> Result<()> {
        Ok(())
    }
}
