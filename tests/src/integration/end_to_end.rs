//! # End-to-End Flows
//!
//! Two nodes talking over loopback TCP:
//!
//! 1. **Listen:** `SelfListening` carries the bound address
//! 2. **Connect:** both sides publish `PeerConnected`
//! 3. **Exchange:** frames become `MessageReceived` in order, keep-alives vanish
//! 4. **Hang-up:** the surviving side publishes `PeerDisconnected`

#[cfg(test)]
mod tests {
    use super::super::*;
    use mesh_network::{ConnectionDirection, EventKind, NetworkConfig, NetworkError, PeerId};
    use std::time::Duration;
    use tokio_stream::StreamExt;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_dial_publishes_peer_connected_on_both_sides() {
        let mut server = listening_node(NetworkConfig::for_testing()).await;
        let (client, mut client_events) = dialing_node(NetworkConfig::for_testing());

        let server_id = client.dial(&server.addr.to_string()).await.unwrap();
        assert_eq!(server_id, PeerId::from_remote(server.addr));

        let connected = next_signal(&mut client_events).await;
        assert_eq!(connected.kind(), EventKind::PeerConnected);
        assert_eq!(connected.origin(), Some(&server_id));
        assert_eq!(connected.payload(), server_id.as_bytes());

        let accepted = next_signal(&mut server.events).await;
        assert_eq!(accepted.kind(), EventKind::PeerConnected);
        let client_id = accepted.origin().cloned().expect("origin");

        let table = server.node.table();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].id, client_id);
        assert_eq!(table[0].direction, ConnectionDirection::Inbound);
        assert_eq!(client.table()[0].direction, ConnectionDirection::Outbound);
    }

    #[tokio::test]
    async fn test_message_reaches_remote_consumer() {
        let mut server = listening_node(NetworkConfig::for_testing()).await;
        let (client, _client_events) = dialing_node(NetworkConfig::for_testing());

        let server_id = client.dial(&server.addr.to_string()).await.unwrap();
        let accepted = next_of_kind(&mut server.events, EventKind::PeerConnected).await;

        let written = client.send_message(&server_id, b"hello").await.unwrap();
        assert_eq!(written, 5);

        let message = next_signal(&mut server.events).await;
        assert_eq!(message.kind(), EventKind::MessageReceived);
        assert_eq!(message.origin(), accepted.origin());
        assert_eq!(message.payload(), b"hello");
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let mut server = listening_node(NetworkConfig::for_testing()).await;
        let (client, _client_events) = dialing_node(NetworkConfig::for_testing());

        let server_id = client.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut server.events, EventKind::PeerConnected).await;

        for i in 0..20u8 {
            client.send_message(&server_id, &[i]).await.unwrap();
        }
        for i in 0..20u8 {
            let message = next_signal(&mut server.events).await;
            assert_eq!(message.kind(), EventKind::MessageReceived);
            assert_eq!(message.payload(), &[i]);
        }
    }

    #[tokio::test]
    async fn test_keepalive_frames_are_not_published() {
        let mut server = listening_node(NetworkConfig::for_testing()).await;
        let (client, _client_events) = dialing_node(NetworkConfig::for_testing());

        let server_id = client.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut server.events, EventKind::PeerConnected).await;

        assert_eq!(client.send_message(&server_id, b"").await.unwrap(), 0);
        assert_quiet(&mut server.events).await;

        client.send_message(&server_id, b"after").await.unwrap();
        let message = next_signal(&mut server.events).await;
        assert_eq!(message.kind(), EventKind::MessageReceived);
        assert_eq!(message.payload(), b"after");
    }

    #[tokio::test]
    async fn test_reply_flows_back_to_dialer() {
        let mut server = listening_node(NetworkConfig::for_testing()).await;
        let (client, mut client_events) = dialing_node(NetworkConfig::for_testing());

        let server_id = client.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut client_events, EventKind::PeerConnected).await;
        let accepted = next_of_kind(&mut server.events, EventKind::PeerConnected).await;
        let client_id = accepted.origin().cloned().unwrap();

        server.node.send_message(&client_id, b"pong").await.unwrap();

        let reply = next_signal(&mut client_events).await;
        assert_eq!(reply.kind(), EventKind::MessageReceived);
        assert_eq!(reply.origin(), Some(&server_id));
        assert_eq!(reply.payload(), b"pong");
    }

    #[tokio::test]
    async fn test_remote_close_publishes_peer_disconnected() {
        let mut server = listening_node(NetworkConfig::for_testing()).await;
        let (client, _client_events) = dialing_node(NetworkConfig::for_testing());

        client.dial(&server.addr.to_string()).await.unwrap();
        let accepted = next_of_kind(&mut server.events, EventKind::PeerConnected).await;

        client.close().await.unwrap();

        let gone = next_signal(&mut server.events).await;
        assert_eq!(gone.kind(), EventKind::PeerDisconnected);
        assert_eq!(gone.origin(), accepted.origin());
        assert_eq!(server.node.peer_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_one_peer_keeps_the_other() {
        let mut server = listening_node(NetworkConfig::for_testing()).await;
        let (first, _first_events) = dialing_node(NetworkConfig::for_testing());
        let (second, _second_events) = dialing_node(NetworkConfig::for_testing());

        first.dial(&server.addr.to_string()).await.unwrap();
        let first_id = next_of_kind(&mut server.events, EventKind::PeerConnected)
            .await
            .origin()
            .cloned()
            .unwrap();
        let server_id = second.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut server.events, EventKind::PeerConnected).await;

        server.node.disconnect(&first_id).await.unwrap();
        let gone = next_signal(&mut server.events).await;
        assert_eq!(gone.kind(), EventKind::PeerDisconnected);
        assert_eq!(gone.origin(), Some(&first_id));
        assert_eq!(server.node.peer_count(), 1);

        second.send_message(&server_id, b"still here").await.unwrap();
        let message = next_signal(&mut server.events).await;
        assert_eq!(message.payload(), b"still here");
    }

    #[tokio::test]
    async fn test_quiet_sender_keeps_stream_framed_after_write_timeout() {
        let mut server = listening_node(NetworkConfig::for_testing()).await;
        let idle = Duration::from_millis(300);
        let (client, mut client_events) =
            dialing_node(NetworkConfig::for_testing().with_peer_idle_timeout(idle));

        let server_id = client.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut client_events, EventKind::PeerConnected).await;
        let client_id = next_of_kind(&mut server.events, EventKind::PeerConnected)
            .await
            .origin()
            .cloned()
            .unwrap();

        // Keep the client's read side alive while it sends nothing.
        for _ in 0..6 {
            server.node.send_message(&client_id, b"").await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let late = client
            .send_message(&server_id, &vec![7u8; 32 * 1024])
            .await
            .unwrap_err();
        assert!(matches!(late, NetworkError::Send { ref source, .. }
            if source.kind() == std::io::ErrorKind::TimedOut));

        assert_eq!(client.send_message(&server_id, b"hi").await.unwrap(), 2);
        let message = next_signal(&mut server.events).await;
        assert_eq!(message.kind(), EventKind::MessageReceived);
        assert_eq!(message.origin(), Some(&client_id));
        assert_eq!(message.payload(), b"hi");
    }

    #[tokio::test]
    async fn test_event_stream_yields_listen_and_connect() {
        let server = mesh_network::Node::new(NetworkConfig::for_testing()).unwrap();
        let cancel = CancellationToken::new();
        let mut stream = server.event_stream(cancel.clone());

        tokio::spawn({
            let server = server.clone();
            async move { server.listen("127.0.0.1:0").await }
        });

        let listening = tokio::time::timeout(WAIT, stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(listening.kind(), EventKind::SelfListening);

        let (client, _client_events) = dialing_node(NetworkConfig::for_testing());
        client
            .dial(&server.local_addr().unwrap().to_string())
            .await
            .unwrap();

        let connected = tokio::time::timeout(WAIT, stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(connected.kind(), EventKind::PeerConnected);

        cancel.cancel();
        let ended = tokio::time::timeout(WAIT, stream.next()).await.unwrap();
        assert!(ended.is_none());
    }
}
