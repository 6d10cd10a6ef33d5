use std::future::Future;

use crate::{error::BoxError, metric::Snapshot};

/// The browser-side source of [`Snapshot`]s.
///
/// `sample` is called twice per trial, immediately before and after the action.
/// It must return every tracked counter at once and must not disturb the page
/// under test.
///
/// Any `Fn() -> impl Future<Output = Result<Snapshot, BoxError>>` closure is a
/// sampler, so a page handle can be plugged in directly:
///
/// ```rust,ignore
/// let sampler = move || {
///     let page = page.clone();
///     async move { page.metrics().await.map_err(Into::into) }
/// };
/// ```
pub trait Sampler {
    fn sample(&self) -> impl Future<Output = Result<Snapshot, BoxError>> + Send;
}

impl<F, Fut> Sampler for F
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Snapshot, BoxError>> + Send,
{
    fn sample(&self) -> impl Future<Output = Result<Snapshot, BoxError>> + Send {
        self()
    }
}
