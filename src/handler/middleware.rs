//! Middleware chain
//!
//! Middleware run after the file has been read and before the body is written. All
//! registered steps for a request run concurrently and are joined before the response is
//! finished. The list is append-only and is snapshotted when a request is dispatched, so a
//! step added mid-flight only affects later requests.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use futures_util::future::try_join_all;

use super::RequestContext;
use crate::error::{BoxError, ServeError};
use crate::http::ResponseSink;

/// Future returned by [`Middleware::call`].
pub type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

/// A post-read, pre-send processing step.
///
/// Implemented for any `Fn(Arc<RequestContext>, Arc<ResponseSink>) -> impl Future` returning
/// `Result<(), BoxError>`, so plain async closures can be registered directly.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Arc<RequestContext>, res: Arc<ResponseSink>) -> MiddlewareFuture;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Arc<RequestContext>, Arc<ResponseSink>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn call(&self, req: Arc<RequestContext>, res: Arc<ResponseSink>) -> MiddlewareFuture {
        Box::pin(self(req, res))
    }
}

/// Ordered, append-only list of middleware, shared by every clone of the server.
#[derive(Clone, Default)]
pub struct MiddlewareList {
    entries: Arc<RwLock<Vec<Arc<dyn Middleware>>>>,
}

impl MiddlewareList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step; insertion order is execution-start order.
    pub fn push(&self, middleware: impl Middleware) {
        self.push_arc(Arc::new(middleware));
    }

    pub fn push_arc(&self, middleware: Arc<dyn Middleware>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(middleware);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current list, taken when a request is dispatched.
    pub fn snapshot(&self) -> Vec<Arc<dyn Middleware>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for MiddlewareList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareList")
            .field("len", &self.len())
            .finish()
    }
}

/// Run every step concurrently and wait for all of them.
///
/// The first failure is returned; an empty chain completes immediately.
pub async fn run_chain(
    chain: &[Arc<dyn Middleware>],
    req: &Arc<RequestContext>,
    res: &Arc<ResponseSink>,
) -> Result<(), ServeError> {
    if chain.is_empty() {
        return Ok(());
    }
    try_join_all(
        chain
            .iter()
            .map(|middleware| middleware.call(Arc::clone(req), Arc::clone(res))),
    )
    .await
    .map(|_| ())
    .map_err(ServeError::Middleware)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{HeaderName, HeaderValue};
    use hyper::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    fn context() -> Arc<RequestContext> {
        let req = Request::get("/a.txt").body(()).unwrap();
        Arc::new(RequestContext::from_request(&req))
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let sink = Arc::new(ResponseSink::new());
        run_chain(&[], &context(), &sink).await.unwrap();
        assert!(!sink.is_ended());
    }

    #[tokio::test]
    async fn test_all_steps_run() {
        let list = MiddlewareList::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for i in 0..3 {
            let counter = Arc::clone(&counter);
            list.push(move |_req: Arc<RequestContext>, res: Arc<ResponseSink>| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    res.set_header(
                        HeaderName::from_bytes(format!("x-step-{i}").as_bytes())?,
                        HeaderValue::from_static("1"),
                    )?;
                    Ok::<(), BoxError>(())
                }
            });
        }

        let sink = Arc::new(ResponseSink::new());
        run_chain(&list.snapshot(), &context(), &sink).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(sink.headers().len(), 3);
    }

    #[tokio::test]
    async fn test_steps_run_concurrently() {
        // Each step waits for the other; a sequential runner would never finish.
        let barrier = Arc::new(Barrier::new(2));
        let list = MiddlewareList::new();
        for _ in 0..2 {
            let barrier = Arc::clone(&barrier);
            list.push(move |_req: Arc<RequestContext>, _res: Arc<ResponseSink>| {
                let barrier = Arc::clone(&barrier);
                async move {
                    barrier.wait().await;
                    Ok::<(), BoxError>(())
                }
            });
        }

        let sink = Arc::new(ResponseSink::new());
        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            run_chain(&list.snapshot(), &context(), &sink),
        )
        .await
        .expect("middleware did not run concurrently")
        .unwrap();
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let list = MiddlewareList::new();
        list.push(|_req: Arc<RequestContext>, _res: Arc<ResponseSink>| async {
            Err::<(), BoxError>("denied".into())
        });

        let sink = Arc::new(ResponseSink::new());
        let err = run_chain(&list.snapshot(), &context(), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, ServeError::Middleware(ref e) if e.to_string() == "denied"));
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_push() {
        let list = MiddlewareList::new();
        list.push(|_req: Arc<RequestContext>, _res: Arc<ResponseSink>| async { Ok::<(), BoxError>(()) });
        let snapshot = list.snapshot();
        list.push(|_req: Arc<RequestContext>, _res: Arc<ResponseSink>| async { Ok::<(), BoxError>(()) });
        assert_eq!(snapshot.len(), 1);
        assert_eq!(list.len(), 2);
    }
}
