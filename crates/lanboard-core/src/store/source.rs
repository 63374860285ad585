// ── Fetch seam between stores and the backend ──

use futures_util::future::BoxFuture;

use crate::error::CoreError;

/// Where a store's full collection comes from.
///
/// Implemented by [`Backend`](crate::backend::Backend) for every entity
/// type; tests plug in in-memory sources.
pub trait EntitySource<T>: Send + Sync {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<T>, CoreError>>;
}
