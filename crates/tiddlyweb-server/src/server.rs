//! The HTTP server.
//!
//! Connections are served by hyper's HTTP/1 implementation on tokio. Each
//! request body is collected (up to `server.max_body_bytes`), then the
//! synchronous pipeline runs on the blocking pool under
//! `server.request_timeout_ms`. [`Server::handle`] is that synchronous
//! part and can be driven directly, without sockets.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use tiddlyweb_config::WikiConfig;
use tiddlyweb_core::Store;
use tiddlyweb_middleware::types::{Outcome, Request, Response};
use tiddlyweb_middleware::{ExtractorTable, HttpError, Pipeline, Reply, RequestContext};
use tiddlyweb_telemetry::{describe_metrics, InFlightGuard};

use crate::error::{ServerError, ServerResult};
use crate::handler::HandlerTable;
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The TiddlyWeb server: pipeline, routes and handlers.
#[derive(Debug)]
pub struct Server {
    config: Arc<WikiConfig>,
    pipeline: Pipeline,
    router: Router,
    handlers: HandlerTable,
}

impl Server {
    /// Creates a server with the standard extractors and handlers.
    pub fn new(config: WikiConfig, store: Arc<dyn Store>) -> ServerResult<Self> {
        Self::with_tables(
            config,
            store,
            &ExtractorTable::with_standard(),
            HandlerTable::standard(),
        )
    }

    /// Creates a server with custom extractor and handler tables.
    pub fn with_tables(
        config: WikiConfig,
        store: Arc<dyn Store>,
        extractors: &ExtractorTable,
        handlers: HandlerTable,
    ) -> ServerResult<Self> {
        let config = Arc::new(config);
        let pipeline = Pipeline::standard(Arc::clone(&config), store, extractors)?;
        let router = Router::wiki(config.server_prefix.clone());
        Ok(Self {
            config,
            pipeline,
            router,
            handlers,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Runs one request through the pipeline and returns the response.
    ///
    /// `HEAD` is served as `GET` with the body removed.
    pub fn handle(&self, request: Request) -> Response {
        let is_head = *request.method() == Method::HEAD;
        let response = self
            .pipeline
            .execute(request, |ctx, request| self.dispatch(ctx, request));
        if is_head {
            response.map(|_| Full::new(Bytes::new()))
        } else {
            response
        }
    }

    fn dispatch(&self, ctx: &mut RequestContext, request: &Request) -> Outcome {
        let method = ctx.method().clone();
        let path = ctx.path().to_string();

        let Some(route) = self.router.match_route(&method, &path) else {
            let allowed = self.router.allowed_methods(&path);
            if allowed.is_empty() {
                return Err(HttpError::NotFound(format!("path {path} not found")));
            }
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(HttpError::MethodNotAllowed { method, allow });
        };

        ctx.route = Some(route.template().to_string());
        let handler = self.handlers.get(route.handler()).ok_or_else(|| {
            HttpError::internal(format!("no handler registered for {}", route.handler()))
        })?;
        debug!(handler = route.handler(), "Dispatching");
        ctx.route_params = route.into_params();
        handler(ctx, request)
    }

    /// Binds the configured address and serves until Ctrl-C or SIGTERM.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr = &self.config.server.http_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {addr}: {e}")))?;
        Arc::new(self).serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` fires, then
    /// waits for open connections up to `server.shutdown_timeout_secs`.
    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> ServerResult<()> {
        describe_metrics();
        info!(
            addr = %listener.local_addr()?,
            prefix = %self.config.server_prefix,
            "Server listening"
        );

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&self);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            let served = server.serve_connection(stream, remote_addr, shutdown);
                            if let Err(e) = served.await {
                                debug!(%remote_addr, error = %e, "Connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => error!(error = %e, "Failed to accept connection"),
                },
                () = shutdown.recv() => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = Duration::from_secs(self.config.server.shutdown_timeout_secs);
        if tokio::time::timeout(timeout, tracker.wait_for_drain()).await.is_err() {
            warn!(
                active = tracker.active_connections(),
                "Shutdown timeout reached with connections still open"
            );
        }
        info!("Server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(&self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_incoming(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);
        tokio::select! {
            result = connection.as_mut() => result,
            () = shutdown.recv() => {
                debug!(%remote_addr, "Closing connection for shutdown");
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        }
    }

    async fn handle_incoming(self: Arc<Self>, request: http::Request<Incoming>) -> Response {
        let _in_flight = InFlightGuard::new();
        let (parts, body) = request.into_parts();

        let body = match Limited::new(body, self.config.server.max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                let status = if e.is::<http_body_util::LengthLimitError>() {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                debug!(error = %e, "Failed to read request body");
                return plain(status, format!("Error reading request body: {e}"));
            }
        };

        let request = http::Request::from_parts(parts, body);
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let timeout = Duration::from_millis(self.config.server.request_timeout_ms);
        let server = Arc::clone(&self);
        let work = tokio::task::spawn_blocking(move || server.handle(request));

        match tokio::time::timeout(timeout, work).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(%method, %path, error = %e, "Request processing panicked");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            Err(_) => {
                warn!(%method, %path, "Request timed out");
                plain(StatusCode::GATEWAY_TIMEOUT, "Request timed out")
            }
        }
    }
}

fn plain(status: StatusCode, message: impl Into<String>) -> Response {
    let mut reply = Reply::text(message);
    reply.status = status;
    reply.into_response()
}
