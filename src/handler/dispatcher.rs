//! Request dispatch
//!
//! Entry point for HTTP request processing: prefix check, path resolution, header policy,
//! file read, content type, middleware, and the Not-Found/error fallbacks.

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use tokio::fs;

use super::fallback::{respond_error, respond_not_found};
use super::middleware::{run_chain, Middleware, MiddlewareList};
use super::path::resolve_file_path;
use super::RequestContext;
use crate::config::{LogFormat, ServerConfig};
use crate::error::{ServeError, ServerError};
use crate::http::{CachePolicy, ContentTypeResolver, CorsHeaders, ResponseSink};
use crate::logger::{self, AccessLogEntry};

struct Inner {
    config: ServerConfig,
    cors: CorsHeaders,
    cache: CachePolicy,
    content_types: ContentTypeResolver,
    middlewares: MiddlewareList,
}

/// Outcome of dispatching one request.
enum Dispatch {
    /// The response is complete.
    Responded(Response<Full<Bytes>>),
    /// This server does not serve the request; headers set so far are kept in `sink`.
    Declined {
        ctx: Arc<RequestContext>,
        sink: Arc<ResponseSink>,
    },
}

/// Static file server.
///
/// Cheap to clone: clones share configuration and the middleware list. Usable directly
/// as a `hyper` service, through [`StaticServer::handle`], or as one stage of a larger
/// pipeline through [`StaticServer::handle_or_else`].
#[derive(Clone)]
pub struct StaticServer {
    inner: Arc<Inner>,
}

impl StaticServer {
    /// Build a server using the richest content-type lookup compiled in.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        Self::with_content_types(config, ContentTypeResolver::detect())
    }

    pub fn with_content_types(
        mut config: ServerConfig,
        content_types: ContentTypeResolver,
    ) -> Result<Self, ServerError> {
        config.root = absolute_root(&config.root)?;
        let cors = CorsHeaders::from_config(&config)?;
        let cache = CachePolicy::from_config(config.disable_cache, config.max_age);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                cors,
                cache,
                content_types,
                middlewares: MiddlewareList::new(),
            }),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn content_types(&self) -> &ContentTypeResolver {
        &self.inner.content_types
    }

    /// Append a middleware step. Requests already dispatched are not affected.
    pub fn use_middleware(&self, middleware: impl Middleware) -> &Self {
        self.inner.middlewares.push(middleware);
        self
    }

    /// Append several middleware steps in order.
    ///
    /// Single steps can also be chained: `server.use_middleware(a).use_middleware(b)`.
    pub fn use_middlewares(
        &self,
        middlewares: impl IntoIterator<Item = Arc<dyn Middleware>>,
    ) -> &Self {
        for middleware in middlewares {
            self.inner.middlewares.push_arc(middleware);
        }
        self
    }

    pub fn middleware_count(&self) -> usize {
        self.inner.middlewares.len()
    }

    /// File a request path maps to under this server's configuration.
    pub fn resolve_path(&self, request_path: &str) -> PathBuf {
        let config = &self.inner.config;
        resolve_file_path(
            request_path,
            &config.prefix,
            &config.root,
            config.index.as_deref(),
        )
    }

    /// Serve a request, answering 404 when it is declined.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>> {
        match self.dispatch(&req).await {
            Dispatch::Responded(response) => response,
            Dispatch::Declined { ctx, sink } => {
                respond_not_found(&self.inner.config.not_found_handler, &ctx, &sink);
                sink.take_response()
            }
        }
    }

    /// Serve a request, handing it to `next` when it is outside the prefix or no file
    /// exists for it.
    ///
    /// Headers already applied (CORS, cache control) are added to `next`'s response
    /// unless it sets them itself.
    pub async fn handle_or_else<B, N, Fut>(&self, req: Request<B>, next: N) -> Response<Full<Bytes>>
    where
        N: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Response<Full<Bytes>>>,
    {
        match self.dispatch(&req).await {
            Dispatch::Responded(response) => response,
            Dispatch::Declined { sink, .. } => {
                let preset = sink.headers();
                let mut response = next(req).await;
                merge_missing_headers(response.headers_mut(), &preset);
                response
            }
        }
    }

    async fn dispatch<B>(&self, req: &Request<B>) -> Dispatch {
        let config = &self.inner.config;
        let chain = self.inner.middlewares.snapshot();
        let mut ctx = RequestContext::from_request(req);

        if !ctx.raw_url().starts_with(config.prefix.as_str()) {
            return Dispatch::Declined {
                ctx: Arc::new(ctx),
                sink: Arc::new(ResponseSink::new()),
            };
        }

        let file_path = self.resolve_path(&ctx.path);
        ctx.set_file_path(file_path.clone());

        let mut headers = HeaderMap::new();
        self.inner.cache.apply(&mut headers);
        self.inner.cors.apply(&mut headers);

        let ctx = Arc::new(ctx);
        let sink = Arc::new(ResponseSink::with_headers_preset(headers));

        let result = match read_file(&file_path).await {
            Ok(contents) => self.serve_file(&ctx, &sink, &file_path, contents, &chain).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => Dispatch::Responded(sink.take_response()),
            Err(err) if err.is_not_found() => Dispatch::Declined { ctx, sink },
            Err(err) => {
                respond_error(&config.error_handler, &err, &ctx, &sink);
                Dispatch::Responded(sink.take_response())
            }
        }
    }

    async fn serve_file(
        &self,
        ctx: &Arc<RequestContext>,
        sink: &Arc<ResponseSink>,
        file_path: &Path,
        contents: Vec<u8>,
        chain: &[Arc<dyn Middleware>],
    ) -> Result<(), ServeError> {
        if let Some(content_type) = self.inner.content_types.resolve_path(file_path) {
            sink.set_header(CONTENT_TYPE, HeaderValue::from_static(content_type))?;
        }

        run_chain(chain, ctx, sink).await?;

        let body_bytes = contents.len();
        // A middleware may already have ended the response itself; its body stands.
        let _ = sink.end(contents);
        self.log_response(ctx, sink.status(), body_bytes);
        Ok(())
    }

    fn log_response(&self, ctx: &RequestContext, status: StatusCode, body_bytes: usize) {
        if let Some(line) = self.access_line(ctx, status, body_bytes) {
            logger::log_access_line(&line);
        }
    }

    /// Access line for a served file, `None` when logging is off or the formatter
    /// produced nothing.
    fn access_line(&self, ctx: &RequestContext, status: StatusCode, body_bytes: usize) -> Option<String> {
        let config = &self.inner.config;
        if !config.logging {
            return None;
        }
        let line = match &config.log_format {
            LogFormat::Default => Some(format!("{} -> {}", ctx.method, ctx.path)),
            LogFormat::Pattern(pattern) => {
                Some(AccessLogEntry::from_context(ctx, status.as_u16(), body_bytes).format(pattern))
            }
            LogFormat::Custom(formatter) => formatter(ctx),
        };
        line.filter(|line| !line.is_empty())
    }
}

impl std::fmt::Debug for StaticServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticServer")
            .field("config", &self.inner.config)
            .field("content_types", &self.inner.content_types)
            .field("middlewares", &self.inner.middlewares)
            .finish_non_exhaustive()
    }
}

impl<B> Service<Request<B>> for StaticServer
where
    B: Send + Sync + 'static,
{
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let server = self.clone();
        Box::pin(async move { Ok(server.handle(req).await) })
    }
}

/// Read the whole file, folding "missing" and "is a directory" into `NotFound`.
async fn read_file(path: &Path) -> Result<Vec<u8>, ServeError> {
    match fs::read(path).await {
        Ok(contents) => Ok(contents),
        Err(err) => match err.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::IsADirectory
            | io::ErrorKind::NotADirectory
            // A path that can never name a file
            | io::ErrorKind::InvalidInput => Err(ServeError::NotFound),
            // Some platforms report a directory read as a permission error
            _ if fs::metadata(path).await.is_ok_and(|meta| meta.is_dir()) => {
                Err(ServeError::NotFound)
            }
            _ => Err(ServeError::Io(err)),
        },
    }
}

fn absolute_root(root: &Path) -> Result<PathBuf, ServerError> {
    if root.as_os_str().is_empty() {
        return Ok(std::env::current_dir()?);
    }
    Ok(std::path::absolute(root)?)
}

fn merge_missing_headers(target: &mut HeaderMap, preset: &HeaderMap) {
    for (name, value) in preset {
        if !target.contains_key(name) {
            target.insert(name.clone(), value.clone());
        }
    }
}
