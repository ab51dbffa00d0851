//! WebSocket server receiving trade events from the upstream watcher

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use crate::shared::types::TradeEvent;

pub fn parse_trade_event(text: &str) -> Result<TradeEvent, serde_json::Error> {
    serde_json::from_str(text)
}

pub struct TradeFeedServer {
    bind_addr: String,
    events: mpsc::Sender<TradeEvent>,
}

impl TradeFeedServer {
    pub fn new(bind_addr: String, events: mpsc::Sender<TradeEvent>) -> Self {
        Self { bind_addr, events }
    }

    /// Accept connections until the listener fails or the event channel closes.
    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        info!(addr = %self.bind_addr, "Trade feed WebSocket server started");

        loop {
            if self.events.is_closed() {
                info!("Event channel closed, stopping trade feed");
                return Ok(());
            }

            match listener.accept().await {
                Ok((stream, addr)) => {
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, addr, events).await;
                    });
                }
                Err(e) => error!(error = %e, "Failed to accept connection"),
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, events: mpsc::Sender<TradeEvent>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(addr = %addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };
    info!(addr = %addr, "Client connected");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    while let Some(message) = ws_rx.next().await {
        match message {
            Ok(Message::Text(text)) => match parse_trade_event(&text) {
                Ok(event) => {
                    debug!(mint = %event.mint, is_buy = event.is_buy, "Trade event received");
                    if events.send(event).await.is_err() {
                        warn!("Dispatcher gone, dropping connection");
                        break;
                    }
                }
                Err(e) => warn!(addr = %addr, error = %e, "Malformed trade event dropped"),
            },
            Ok(Message::Ping(data)) => {
                if let Err(e) = ws_tx.send(Message::Pong(data)).await {
                    debug!(addr = %addr, error = %e, "Failed to send pong");
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(addr = %addr, error = %e, "WebSocket error");
                break;
            }
        }
    }

    info!(addr = %addr, "Client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_message() {
        let text = r#"{"creator":"744ZryTiFQ1LDySKUikc93M7MT7ZdB3DnFGsrT1gYhNW","mint":"M1",
            "amount":"1000","sol_amount":"0.5","bonding_curve":"","associated_bonding_curve":"",
            "decimal":6,"is_buy":true,"origin":"normal","timestamp":1700000000,"signature":"s"}"#;
        let event = parse_trade_event(text).unwrap();
        assert_eq!(event.decimals, Some(6));
        assert!(event.pool_refs().is_none());
    }

    #[test]
    fn test_malformed_message_rejected() {
        assert!(parse_trade_event("not json").is_err());
        assert!(parse_trade_event(r#"{"mint":"M1"}"#).is_err());
    }

    #[tokio::test]
    async fn test_events_forwarded_over_websocket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            handle_connection(stream, peer, tx).await;
        });

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
            .await
            .unwrap();
        client.send(Message::Text("garbage".to_string())).await.unwrap();
        client
            .send(Message::Text(
                r#"{"mint":"M1","amount":"10","sol_amount":"1","is_buy":false}"#.to_string(),
            ))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.mint, "M1");
        assert!(!event.is_buy);
    }
}
