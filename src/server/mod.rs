//! HTTP Server
//!
//! Accept loop over `tokio::net::TcpListener`. Each connection carries one
//! request and is handled on its own task; every request is raced against
//! the configured outer deadline.

pub mod http;
pub mod router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::models::response::ErrorBody;
use crate::state::AppState;
use crate::utils::error::AppResult;

pub use http::{read_request, HttpRequest, HttpResponse, RequestError, MAX_BODY_BYTES};

/// Bound listener plus the state handlers run against
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl Server {
    /// Bind to the configured `host:port`
    pub async fn bind(state: Arc<AppState>) -> AppResult<Self> {
        let address = state.config().bind_address();
        Self::bind_to(&address, state).await
    }

    /// Bind to an explicit address; port 0 picks a free port
    pub async fn bind_to(address: &str, state: Arc<AppState>) -> AppResult<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> AppResult<()> {
        tracing::info!(address = %self.local_addr()?, "server listening");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("server shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let state = self.state.clone();
                        tokio::spawn(async move {
                            handle_connection(state, stream, peer).await;
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection(state: Arc<AppState>, mut stream: TcpStream, peer: SocketAddr) {
    let deadline = state.config().request_deadline();

    let request = match tokio::time::timeout(deadline, read_request(&mut stream)).await {
        Ok(Ok(request)) => request,
        Ok(Err(err)) => {
            tracing::debug!(%peer, error = %err, "failed to read request");
            if let Some(response) = err.to_response() {
                write_response(&state, &mut stream, &response).await;
            }
            return;
        }
        Err(_) => {
            tracing::debug!(%peer, "timed out reading request");
            return;
        }
    };

    let response = dispatch(&state, &request).await;
    write_response(&state, &mut stream, &response).await;
}

/// Route `request` under the outer deadline, logging start and finish
pub async fn dispatch(state: &AppState, request: &HttpRequest) -> HttpResponse {
    let started = Instant::now();
    tracing::info!(method = %request.method, path = %request.path, "request started");

    let response =
        match tokio::time::timeout(state.config().request_deadline(), router::route(state, request))
            .await
        {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    "request exceeded outer deadline"
                );
                HttpResponse::error(
                    504,
                    ErrorBody::new(
                        "Request timeout",
                        "The request took too long to process. Please try with a simpler prompt.",
                    ),
                )
            }
        };

    tracing::info!(
        method = %request.method,
        path = %request.path,
        status = response.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request finished"
    );
    response
}

async fn write_response(state: &AppState, stream: &mut TcpStream, response: &HttpResponse) {
    let bytes = response.to_bytes(&state.config().frontend_url);
    if let Err(e) = stream.write_all(&bytes).await {
        tracing::debug!(error = %e, "failed to write response");
        return;
    }
    let _ = stream.shutdown().await;
}
