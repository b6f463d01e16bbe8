//! Integration tests for the WebSocket transport.
//!
//! These tests spin up a real WebSocket server and client on loopback to
//! verify that text, binary and control frames flow the way the rest of
//! the workspace expects.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use parlor_transport::{
        Connection, Frame, PendingConnection, Transport, TransportError,
        WebSocketConnection, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on an OS-assigned port, connects one client and returns both
    /// ends of the connection.
    async fn connected_pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let server_handle = tokio::spawn(async move {
            let pending = transport.accept().await.expect("should accept");
            pending.establish().await.expect("handshake should complete")
        });

        let (client_ws, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect");
        let server_conn = server_handle.await.expect("task should complete");
        (server_conn, client_ws)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (server_conn, mut client_ws) = connected_pair().await;
        assert!(server_conn.id().into_inner() > 0);

        // --- Server sends JSON, client receives a text frame ---
        server_conn
            .send(br#"{"type":"hello"}"#)
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "utf-8 payloads should go out as text");
        assert_eq!(msg.into_data().as_ref(), br#"{"type":"hello"}"#);

        // --- Client sends text, server receives the bytes ---
        client_ws
            .send(Message::Text("hello from client".to_string().into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, Frame::Data(b"hello from client".to_vec()));

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_send_non_utf8_goes_out_as_binary() {
        let (server_conn, mut client_ws) = connected_pair().await;

        server_conn.send(&[0xff, 0x00, 0xfe]).await.unwrap();
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
        assert_eq!(msg.into_data().as_ref(), &[0xff, 0x00, 0xfe]);
    }

    #[tokio::test]
    async fn test_websocket_recv_binary_frame_returns_data() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws
            .send(Message::Binary(vec![1, 2, 3].into()))
            .await
            .unwrap();
        let frame = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(frame, Frame::Data(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_websocket_recv_pong_returns_heartbeat() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws
            .send(Message::Pong(Vec::new().into()))
            .await
            .unwrap();
        let frame = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(frame, Frame::Heartbeat);
    }

    #[tokio::test]
    async fn test_websocket_ping_reaches_client() {
        let (server_conn, mut client_ws) = connected_pair().await;

        server_conn.ping().await.expect("ping should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(matches!(msg, Message::Ping(_)));
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_pending_does_not_block() {
        let (server_conn, mut client_ws) = connected_pair().await;
        let server_conn = std::sync::Arc::new(server_conn);

        // Park a reader on the connection first.
        let reader = {
            let conn = std::sync::Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::task::yield_now().await;

        // A send must still go through while the reader is waiting.
        tokio::time::timeout(
            Duration::from_secs(2),
            server_conn.send(b"while reading"),
        )
        .await
        .expect("send should not wait on recv")
        .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"while reading");

        client_ws.send(Message::Text("done".to_string().into())).await.unwrap();
        let frame = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(frame, Frame::Data(b"done".to_vec()));
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_establish_stalled_handshake_times_out() {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap();
        let mut transport =
            transport.with_handshake_timeout(Duration::from_millis(100));

        // A raw TCP client that never sends the HTTP upgrade request.
        let _raw = tokio::net::TcpStream::connect(addr).await.unwrap();

        let pending = transport.accept().await.expect("tcp accept should succeed");
        let err = match pending.establish().await {
            Ok(_) => panic!("establish should fail on a stalled handshake"),
            Err(e) => e,
        };
        assert!(matches!(err, TransportError::HandshakeTimeout(_)));
    }

    #[tokio::test]
    async fn test_websocket_accept_silent_peer_does_not_block_next_peer() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap();

        // Default 10s handshake timeout; this peer never upgrades.
        let _silent = tokio::net::TcpStream::connect(addr).await.unwrap();
        let silent = transport.accept().await.expect("should accept silent peer");
        let silent_id = silent.id();
        let _parked = tokio::spawn(silent.establish());

        let server_handle = tokio::spawn(async move {
            let pending = transport.accept().await.expect("should accept");
            pending.establish().await.expect("handshake should complete")
        });
        let (_client, _) = tokio::time::timeout(
            Duration::from_secs(2),
            tokio_tungstenite::connect_async(format!("ws://{addr}")),
        )
        .await
        .expect("second client should not wait on the silent one")
        .expect("client should connect");

        let conn = tokio::time::timeout(Duration::from_secs(2), server_handle)
            .await
            .expect("server side should finish promptly")
            .expect("task should complete");
        assert_ne!(conn.id(), silent_id);
    }
}
