//! # Shutdown
//!
//! `close` ends every connection, publishes exactly one node-closed signal
//! (`PeerDisconnected` without an origin) and leaves the node refusing work.

#[cfg(test)]
mod tests {
    use super::super::*;
    use mesh_network::{EventKind, NetworkConfig, NetworkError, PeerId};

    #[tokio::test]
    async fn test_close_notifies_remote_and_signals_once() {
        let mut server = listening_node(NetworkConfig::for_testing()).await;
        let (client, mut client_events) = dialing_node(NetworkConfig::for_testing());

        let server_id = client.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut client_events, EventKind::PeerConnected).await;
        next_of_kind(&mut server.events, EventKind::PeerConnected).await;

        let report = server.node.close().await.unwrap();
        assert_eq!(report.closed, 1);
        assert!(report.is_clean());
        assert!(server.node.is_closed());
        assert_eq!(server.node.peer_count(), 0);

        let closed = next_signal(&mut server.events).await;
        assert_eq!(closed.kind(), EventKind::PeerDisconnected);
        assert!(closed.origin().is_none());
        assert_eq!(closed.payload_str(), Some(server.addr.to_string().as_str()));
        assert_quiet(&mut server.events).await;

        let gone = next_signal(&mut client_events).await;
        assert_eq!(gone.kind(), EventKind::PeerDisconnected);
        assert_eq!(gone.origin(), Some(&server_id));
        assert_eq!(client.peer_count(), 0);
    }

    #[tokio::test]
    async fn test_double_close_rejected() {
        let server = listening_node(NetworkConfig::for_testing()).await;
        server.node.close().await.unwrap();

        let again = server.node.close().await.unwrap_err();
        assert!(matches!(again, NetworkError::AlreadyClosed));
    }

    #[tokio::test]
    async fn test_listener_stops_accepting_after_close() {
        let server = listening_node(NetworkConfig::for_testing()).await;
        server.node.close().await.unwrap();

        let (client, _client_events) = dialing_node(NetworkConfig::for_testing());
        wait_until(|| {
            std::net::TcpStream::connect_timeout(
                &server.addr,
                std::time::Duration::from_millis(50),
            )
            .is_err()
        })
        .await;
        assert!(client.dial(&server.addr.to_string()).await.is_err());
        assert_eq!(server.node.peer_count(), 0);
    }

    #[tokio::test]
    async fn test_operations_after_close() {
        let server = listening_node(NetworkConfig::for_testing()).await;
        server.node.close().await.unwrap();

        assert!(matches!(
            server.node.listen("127.0.0.1:0").await,
            Err(NetworkError::NodeClosed)
        ));
        assert!(matches!(
            server.node.dial(&server.addr.to_string()).await,
            Err(NetworkError::NodeClosed)
        ));
    }

    #[tokio::test]
    async fn test_send_to_unknown_peer() {
        let (node, _events) = dialing_node(NetworkConfig::for_testing());
        let unknown = PeerId::new("203.0.113.9:7000");

        let err = node.send_message(&unknown, b"anyone?").await.unwrap_err();
        assert!(matches!(err, NetworkError::PeerNotFound(ref id) if id == &unknown));
    }
}
