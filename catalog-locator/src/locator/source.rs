//! The page source seam.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

use crate::catalog::PageInfo;
use crate::errors::SourceError;

/// Supplies listing pages to the locator.
///
/// Implementations apply the catalog's entry qualification before returning
/// and report out-of-range pages as [`PageInfo::missing`] rather than as an
/// error. Errors are reserved for failed fetches; only
/// [`SourceError::Fatal`] aborts a search.
///
/// Each search should use its own source instance (or one bound to its own
/// session) so navigation state is never shared between searches.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the 1-based page `page_number`.
    async fn fetch_page(&self, page_number: u32) -> Result<PageInfo, SourceError>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    async fn fetch_page(&self, page_number: u32) -> Result<PageInfo, SourceError> {
        (**self).fetch_page(page_number).await
    }
}

/// Adapts a closure returning a boxed future into a [`PageSource`].
///
/// ```rust,ignore
/// let source = FnPageSource::new(move |n| {
///     let session = session.clone();
///     Box::pin(async move { session.listing(n).await })
/// });
/// ```
pub struct FnPageSource<F> {
    fetch: F,
}

impl<F> FnPageSource<F>
where
    F: Fn(u32) -> BoxFuture<'static, Result<PageInfo, SourceError>> + Send + Sync,
{
    /// Wraps a fetch closure.
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

#[async_trait]
impl<F> PageSource for FnPageSource<F>
where
    F: Fn(u32) -> BoxFuture<'static, Result<PageInfo, SourceError>> + Send + Sync,
{
    async fn fetch_page(&self, page_number: u32) -> Result<PageInfo, SourceError> {
        (self.fetch)(page_number).await
    }
}

impl<F> std::fmt::Debug for FnPageSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPageSource").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Entry;

    #[tokio::test]
    async fn test_fn_page_source() {
        let source = FnPageSource::new(|n| {
            Box::pin(async move {
                if n == 1 {
                    Ok(PageInfo::new(1, vec![Entry::new("a.exe", "/a")]))
                } else {
                    Ok(PageInfo::missing(n))
                }
            })
        });

        assert!(source.fetch_page(1).await.unwrap().exists());
        assert!(!source.fetch_page(2).await.unwrap().exists());
    }

    #[tokio::test]
    async fn test_arc_source_delegates() {
        let source: Arc<dyn PageSource> = Arc::new(FnPageSource::new(|n| {
            Box::pin(async move { Err(SourceError::timeout(format!("page {n}"))) })
        }));
        let err = source.fetch_page(7).await.unwrap_err();
        assert_eq!(err, SourceError::timeout("page 7"));
    }
}
