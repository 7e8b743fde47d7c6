//! WebSocket handling.
//!
//! # Responsibilities
//! - Echo handler used as the inner application behind the origin layer
//! - Origin check for raw `tokio-tungstenite` servers via the handshake callback
//!
//! # Data Flow
//! ```text
//! axum:        upgrade request → OriginValidatorLayer → ws_echo_handler → echo loop
//! tungstenite: TcpStream → accept_guarded (handshake_guard) → echo loop
//! ```
//!
//! # Design Decisions
//! - Rejection happens during the handshake; no frames are exchanged
//! - Close frames end the session, ping/pong handled by the libraries

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    tungstenite::{
        self,
        handshake::server::{ErrorResponse, Request as HsRequest, Response as HsResponse},
        http::StatusCode,
    },
    WebSocketStream,
};
use uuid::Uuid;

use crate::observability::metrics;
use crate::security::OriginPolicy;

/// Upgrade and echo every text or binary frame back to the client.
pub async fn ws_echo_handler(ws: WebSocketUpgrade) -> Response {
    let connection_id = Uuid::new_v4();
    ws.on_upgrade(move |socket| echo_session(socket, connection_id))
}

async fn echo_session(mut socket: WebSocket, connection_id: Uuid) {
    tracing::info!(%connection_id, "WebSocket session opened");
    metrics::record_connection();

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%connection_id, error = %e, "WebSocket receive failed");
                break;
            }
        };

        match msg {
            Message::Text(_) | Message::Binary(_) => {
                if let Err(e) = socket.send(msg).await {
                    tracing::debug!(%connection_id, error = %e, "WebSocket send failed");
                    break;
                }
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    tracing::info!(%connection_id, "WebSocket session closed");
}

/// Build an `accept_hdr_async` callback that enforces `policy`.
///
/// Rejected handshakes are answered with `403 Forbidden`.
pub fn handshake_guard<P>(
    policy: Arc<P>,
) -> impl FnOnce(&HsRequest, HsResponse) -> Result<HsResponse, ErrorResponse> + Unpin
where
    P: OriginPolicy + ?Sized,
{
    move |req: &HsRequest, response: HsResponse| match policy.check_headers(req.headers()) {
        Ok(acceptance) => {
            metrics::record_origin_decision(acceptance.outcome());
            Ok(response)
        }
        Err(rejection) => {
            tracing::warn!(
                path = %req.uri().path(),
                outcome = rejection.outcome(),
                reason = %rejection,
                "Origin rejected"
            );
            metrics::record_origin_decision(rejection.outcome());
            let mut err = ErrorResponse::new(Some("Origin not allowed".to_string()));
            *err.status_mut() = StatusCode::FORBIDDEN;
            Err(err)
        }
    }
}

/// Accept a WebSocket handshake on `stream`, enforcing `policy`.
pub async fn accept_guarded<P>(
    stream: TcpStream,
    policy: Arc<P>,
) -> Result<WebSocketStream<TcpStream>, tungstenite::Error>
where
    P: OriginPolicy + ?Sized,
{
    tokio_tungstenite::accept_hdr_async(stream, handshake_guard(policy)).await
}

/// Accept with `policy` and echo until the client closes.
pub async fn serve_guarded_echo<P>(
    stream: TcpStream,
    policy: Arc<P>,
) -> Result<(), tungstenite::Error>
where
    P: OriginPolicy + ?Sized,
{
    let peer = stream.peer_addr().ok();
    let mut ws = accept_guarded(stream, policy).await?;
    let connection_id = Uuid::new_v4();
    tracing::info!(%connection_id, ?peer, "WebSocket session opened");
    metrics::record_connection();

    while let Some(msg) = ws.next().await {
        let msg = msg?;
        if msg.is_text() || msg.is_binary() {
            ws.send(msg).await?;
        } else if msg.is_close() {
            break;
        }
    }

    tracing::info!(%connection_id, "WebSocket session closed");
    Ok(())
}
