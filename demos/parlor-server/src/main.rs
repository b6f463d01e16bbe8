//! Parlor demo server.
//!
//! ```text
//! PARLOR_ADDR=127.0.0.1:9000 cargo run -p parlor-server
//! PORT=3000 cargo run -p parlor-server        # binds 0.0.0.0:3000
//! RUST_LOG=debug cargo run -p parlor-server
//! ```

use parlor::prelude::*;

/// Picks the listen address: `PARLOR_ADDR` wins, then `PORT` on all
/// interfaces, then `0.0.0.0:8080`.
fn bind_addr(parlor_addr: Option<String>, port: Option<String>) -> String {
    if let Some(addr) = parlor_addr.filter(|a| !a.trim().is_empty()) {
        return addr;
    }
    match port.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(port) => format!("0.0.0.0:{port}"),
        None => "0.0.0.0:8080".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    parlor::telemetry::init();

    let addr = bind_addr(std::env::var("PARLOR_ADDR").ok(), std::env::var("PORT").ok());
    let server = ParlorServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start() -> String {
        let server = ParlorServerBuilder::new()
            .bind("127.0.0.1:0")
            .build()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        addr
    }

    async fn ws(addr: &str) -> Ws {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        ws
    }

    async fn send(ws: &mut Ws, envelope: Value) {
        ws.send(Message::Text(envelope.to_string().into())).await.unwrap();
    }

    /// Reads until a frame of `kind` arrives; returns its payload as JSON.
    async fn until(ws: &mut Ws, kind: &str) -> Value {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
                .await
                .expect("timed out")
                .unwrap()
                .unwrap();
            if !msg.is_text() {
                continue;
            }
            let frame: Value = serde_json::from_slice(&msg.into_data()).unwrap();
            if frame["type"] == kind {
                let payload = frame["payload"].as_str().unwrap();
                return serde_json::from_str(payload).unwrap_or(Value::Null);
            }
        }
    }

    #[test]
    fn test_bind_addr_prefers_parlor_addr() {
        assert_eq!(
            bind_addr(Some("127.0.0.1:9000".into()), Some("3000".into())),
            "127.0.0.1:9000"
        );
    }

    #[test]
    fn test_bind_addr_uses_port_on_all_interfaces() {
        assert_eq!(bind_addr(None, Some("3000".into())), "0.0.0.0:3000");
        assert_eq!(bind_addr(Some("  ".into()), Some("3000".into())), "0.0.0.0:3000");
    }

    #[test]
    fn test_bind_addr_default() {
        assert_eq!(bind_addr(None, None), "0.0.0.0:8080");
        assert_eq!(bind_addr(None, Some(String::new())), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_rps_round_over_the_wire() {
        let addr = start().await;
        let mut p1 = ws(&addr).await;
        let mut p2 = ws(&addr).await;

        send(&mut p1, json!({ "type": "create", "payload": "", "gameType": "rps", "username": "ann" })).await;
        let code = until(&mut p1, "roomCreated").await["code"]
            .as_str()
            .unwrap()
            .to_string();

        send(&mut p2, json!({ "type": "join", "payload": "", "code": code, "username": "ben" })).await;
        until(&mut p2, "startGame").await;

        send(&mut p1, json!({ "type": "rpsChoice", "payload": r#"{"choice":"rock"}"# })).await;
        let made = until(&mut p2, "rpsChoiceMade").await;
        assert_eq!(made["player"], "P1");
        assert!(made.get("choice").is_none(), "the choice stays hidden");

        send(&mut p2, json!({ "type": "rpsChoice", "payload": r#"{"choice":"paper"}"# })).await;
        let result = until(&mut p1, "rpsResult").await;
        assert_eq!(result["p1"], "rock");
        assert_eq!(result["p2"], "paper");
        assert_eq!(result["winner"], "P2");
        assert_eq!(result["round"], 1);
    }
}
