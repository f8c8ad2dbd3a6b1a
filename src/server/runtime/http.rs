//! HTTP surface of the tool server: discovery, invocation and liveness.
use std::{io, pin::pin, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, Request, State,
    },
    http::{
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONNECTION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode, Uri,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    service::TowerToHyperService,
};
use serde::Serialize;
use tokio::{net::TcpListener, time};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tower_http::{timeout::RequestBodyTimeoutLayer, trace::TraceLayer};
use tracing::{debug, warn};

use crate::lib::errors::ProtocolError;

use super::{Dispatcher, ServerInfo, ToolRegistry};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Process-scoped state shared by every request handler.
#[derive(Debug)]
pub struct ServerContext {
    registry: Arc<ToolRegistry>,
    dispatcher: Dispatcher,
    info: ServerInfo,
    read_timeout: Duration,
}

impl ServerContext {
    /// Freeze `registry` and build the dispatcher over it.
    pub fn new(registry: ToolRegistry, read_timeout: Duration) -> Self {
        let registry = Arc::new(registry);
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&registry)),
            registry,
            info: ServerInfo::current(),
            read_timeout,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }
}

impl IntoResponse for ProtocolError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body())).into_response()
    }
}

impl From<PathRejection> for ProtocolError {
    fn from(rejection: PathRejection) -> Self {
        ProtocolError::MalformedRequest {
            status: rejection.status().as_u16(),
            reason: rejection.body_text(),
        }
    }
}

impl From<BytesRejection> for ProtocolError {
    fn from(rejection: BytesRejection) -> Self {
        ProtocolError::MalformedRequest {
            status: rejection.status().as_u16(),
            reason: rejection.body_text(),
        }
    }
}

/// Build the router serving the tool protocol.
pub fn router(ctx: Arc<ServerContext>) -> Router {
    let read_timeout = ctx.read_timeout;
    Router::new()
        .route("/tools", get(list_tools).fallback(unrouted))
        .route("/tools/{name}", post(invoke_tool).fallback(unrouted))
        .fallback(unrouted)
        .layer(middleware::from_fn(protocol_headers))
        .layer(RequestBodyTimeoutLayer::new(read_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Serve `listener` until `shutdown` is cancelled, then drain open connections.
///
/// Each connection runs on its own task, answers one request and closes.
/// A peer that does not finish its request headers within the read timeout
/// is disconnected; the body is bounded by the same timeout in [`router`].
pub async fn serve(
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    shutdown: CancellationToken,
) -> io::Result<()> {
    let read_timeout = ctx.read_timeout;
    let app = router(ctx);
    let mut http = http1::Builder::new();
    http.timer(TokioTimer::new())
        .header_read_timeout(read_timeout)
        .keep_alive(false);
    let connections = TaskTracker::new();

    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(
                        target: "crontab_explorer::runtime",
                        error = %err,
                        "Failed to accept connection"
                    );
                    time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            },
        };

        let connection =
            http.serve_connection(TokioIo::new(stream), TowerToHyperService::new(app.clone()));
        let shutdown = shutdown.clone();
        connections.spawn(async move {
            let mut connection = pin!(connection);
            let mut draining = false;
            let result = loop {
                tokio::select! {
                    result = connection.as_mut() => break result,
                    _ = shutdown.cancelled(), if !draining => {
                        draining = true;
                        connection.as_mut().graceful_shutdown();
                    }
                }
            };
            if let Err(err) = result {
                debug!(
                    target: "crontab_explorer::runtime",
                    peer = %peer,
                    error = %err,
                    "Connection closed with error"
                );
            }
        });
    }

    connections.close();
    connections.wait().await;
    Ok(())
}

async fn list_tools(State(ctx): State<Arc<ServerContext>>) -> Response {
    pretty_json(&ctx.registry().list())
}

async fn invoke_tool(
    State(ctx): State<Arc<ServerContext>>,
    name: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let (Path(name), body) = match (name, body) {
        (Ok(name), Ok(body)) => (name, body),
        (Err(rejection), _) => return ProtocolError::from(rejection).into_response(),
        (_, Err(rejection)) => return ProtocolError::from(rejection).into_response(),
    };
    match ctx.dispatcher().dispatch(&name, &body).await.into_result() {
        Ok(output) => pretty_json(&output),
        Err(err) => err.into_response(),
    }
}

/// Unknown paths: liveness info for `GET`, `Invalid endpoint` for `POST`.
async fn unrouted(State(ctx): State<Arc<ServerContext>>, method: Method, uri: Uri) -> Response {
    match method {
        Method::GET | Method::HEAD => pretty_json(ctx.info()),
        Method::POST => {
            debug!(
                target: "crontab_explorer::runtime",
                path = %uri.path(),
                "POST to unknown endpoint"
            );
            ProtocolError::InvalidEndpoint.into_response()
        }
        _ => ProtocolError::MethodNotAllowed.into_response(),
    }
}

async fn protocol_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    response
}

fn pretty_json<T: Serialize + ?Sized>(value: &T) -> Response {
    match serde_json::to_vec_pretty(value) {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response(),
        Err(err) => ProtocolError::DispatchFault {
            cause: err.to_string(),
        }
        .into_response(),
    }
}
