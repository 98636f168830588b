use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::error::{LangCursorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    Start,
    Stop,
    Status,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ControlRequest {
    pub command: ControlCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: Option<String>,
    #[serde(default)]
    pub running: bool,
    /// `"ko"` or `"en"` once the running session has ticked.
    #[serde(default)]
    pub language: Option<String>,
}

impl ControlResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            running: false,
            language: None,
        }
    }
}

/// A command from one connection, answered by whoever owns the controller.
#[derive(Debug)]
pub struct ControlMessage {
    pub command: ControlCommand,
    pub reply: oneshot::Sender<ControlResponse>,
}

pub type ControlSender = mpsc::Sender<ControlMessage>;
pub type ControlReceiver = mpsc::Receiver<ControlMessage>;

pub fn create_control_channel() -> (ControlSender, ControlReceiver) {
    mpsc::channel(16)
}

/// Binds the control address up front so a port clash fails the daemon
/// before it touches any settings.
pub async fn bind_control_server(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(&addr)
        .await
        .map_err(|e| LangCursorError::Control(format!("cannot listen on {}: {}", addr, e)))
}

pub async fn serve(listener: TcpListener, control_tx: ControlSender) -> Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "control server listening");

    while let Ok((stream, peer_addr)) = listener.accept().await {
        tracing::debug!(peer = %peer_addr, "new control connection");
        let tx = control_tx.clone();
        tokio::spawn(handle_connection(stream, peer_addr, tx));
    }

    Ok(())
}

async fn dispatch(control_tx: &ControlSender, command: ControlCommand) -> ControlResponse {
    let (reply_tx, reply_rx) = oneshot::channel();
    let message = ControlMessage {
        command,
        reply: reply_tx,
    };

    if control_tx.send(message).await.is_err() {
        return ControlResponse::failure("daemon is shutting down");
    }

    reply_rx
        .await
        .unwrap_or_else(|_| ControlResponse::failure("daemon dropped the request"))
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, control_tx: ControlSender) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(peer = %peer_addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = match serde_json::from_str::<ControlRequest>(&text) {
                    Ok(request) => {
                        tracing::debug!(peer = %peer_addr, command = ?request.command, "control request");
                        dispatch(&control_tx, request.command).await
                    }
                    Err(e) => {
                        tracing::warn!(peer = %peer_addr, error = %e, "failed to parse control request");
                        ControlResponse::failure(format!("Parse error: {}", e))
                    }
                };

                if let Ok(response_json) = serde_json::to_string(&response) {
                    if let Err(e) = ws_sender.send(Message::Text(response_json)).await {
                        tracing::warn!(peer = %peer_addr, error = %e, "failed to send control response");
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(data)) => {
                if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                    tracing::warn!(peer = %peer_addr, error = %e, "failed to send pong");
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(peer = %peer_addr, error = %e, "WebSocket error");
                break;
            }
        }
    }

    tracing::debug!(peer = %peer_addr, "control connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parsing() {
        let request: ControlRequest = serde_json::from_str(r#"{"command":"start"}"#).unwrap();
        assert_eq!(request.command, ControlCommand::Start);
        assert!(serde_json::from_str::<ControlRequest>(r#"{"command":"restart"}"#).is_err());
    }

    #[test]
    fn test_response_serialization() {
        let response = ControlResponse {
            success: true,
            message: Some("started".to_string()),
            running: true,
            language: Some("ko".to_string()),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"language\":\"ko\""));
    }

    #[tokio::test]
    async fn test_bind_fails_when_address_taken() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        assert!(matches!(
            bind_control_server(addr).await,
            Err(LangCursorError::Control(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_without_owner_fails() {
        let (tx, rx) = create_control_channel();
        drop(rx);
        let response = dispatch(&tx, ControlCommand::Status).await;
        assert!(!response.success);
    }
}
