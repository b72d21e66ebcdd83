use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::engine::engine::EngineSnapshot;

#[derive(Debug, Deserialize, Clone)]
pub struct ControlMessage {
    pub action: String,
    #[serde(default)]
    pub work_minutes: Option<u32>,
    #[serde(default)]
    pub short_break_minutes: Option<u32>,
    #[serde(default)]
    pub long_break_minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: Option<String>,
}

pub type CommandSender = mpsc::UnboundedSender<ControlMessage>;
pub type CommandReceiver = mpsc::UnboundedReceiver<ControlMessage>;

pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}

pub fn is_known_action(action: &str) -> bool {
    matches!(action, "toggle" | "reset" | "skip" | "settings")
}

pub async fn start_control_server(
    addr: SocketAddr,
    command_tx: CommandSender,
    snapshot_rx: watch::Receiver<EngineSnapshot>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&addr).await?;
    println!("Control server listening on: {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        println!("New control connection from: {}", peer_addr);
        let tx = command_tx.clone();
        let rx = snapshot_rx.clone();
        tokio::spawn(handle_connection(stream, peer_addr, tx, rx));
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    command_tx: CommandSender,
    mut snapshot_rx: watch::Receiver<EngineSnapshot>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed with {}: {}", peer_addr, e);
            return;
        }
    };

    println!("WebSocket handshake completed with {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Push the current state right away so clients can render without
    // waiting for the next change.
    let snapshot = snapshot_rx.borrow_and_update().clone();
    if let Ok(json) = serde_json::to_string(&snapshot) {
        if ws_sender.send(Message::Text(json)).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshot_rx.borrow_and_update().clone();
                if let Ok(json) = serde_json::to_string(&snapshot) {
                    if let Err(e) = ws_sender.send(Message::Text(json)).await {
                        eprintln!("Failed to push state to {}: {}", peer_addr, e);
                        break;
                    }
                }
            }
            msg = ws_receiver.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        let response = match serde_json::from_str::<ControlMessage>(&text) {
                            Ok(control) if is_known_action(&control.action) => {
                                println!("[Control] Received: action={}", control.action);
                                let action = control.action.clone();
                                if let Err(e) = command_tx.send(control) {
                                    eprintln!("Failed to forward control command: {}", e);
                                    ControlResponse {
                                        success: false,
                                        message: Some("Engine is gone".to_string()),
                                    }
                                } else {
                                    ControlResponse {
                                        success: true,
                                        message: Some(format!("Accepted: {}", action)),
                                    }
                                }
                            }
                            Ok(control) => ControlResponse {
                                success: false,
                                message: Some(format!("Unknown action: {}", control.action)),
                            },
                            Err(e) => {
                                eprintln!("Failed to parse control message: {}", e);
                                ControlResponse {
                                    success: false,
                                    message: Some(format!("Parse error: {}", e)),
                                }
                            }
                        };

                        if let Ok(response_json) = serde_json::to_string(&response) {
                            if let Err(e) = ws_sender.send(Message::Text(response_json)).await {
                                eprintln!("Failed to send control response: {}", e);
                                break;
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        println!("Control connection closed by {}", peer_addr);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                            eprintln!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        eprintln!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                }
            }
        }
    }

    println!("Control connection with {} terminated", peer_addr);
}
