use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::error::{LangCursorError, Result};
use crate::ws::control_server::{ControlCommand, ControlRequest, ControlResponse};

/// Sends one command to a running daemon and waits for its answer.
pub async fn send_command(addr: SocketAddr, command: ControlCommand) -> Result<ControlResponse> {
    let (mut ws, _) = connect_async(format!("ws://{addr}")).await?;

    let request = serde_json::to_string(&ControlRequest { command })?;
    ws.send(Message::Text(request)).await?;

    while let Some(msg) = ws.next().await {
        match msg? {
            Message::Text(text) => {
                let response: ControlResponse = serde_json::from_str(&text)?;
                let _ = ws.close(None).await;
                return Ok(response);
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    Err(LangCursorError::Control(
        "connection closed before the daemon answered".into(),
    ))
}
