//! # Admission Control
//!
//! A full routing table turns new connections away: the rejected socket is
//! closed, nothing is published for it and the table size never exceeds
//! `max_peers`.

#[cfg(test)]
mod tests {
    use super::super::*;
    use mesh_network::{EventKind, NetworkConfig};

    #[tokio::test]
    async fn test_second_connection_rejected_when_full() {
        let mut server = listening_node(NetworkConfig::for_testing().with_max_peers(1)).await;
        let (first, _first_events) = dialing_node(NetworkConfig::for_testing());
        let (second, mut second_events) = dialing_node(NetworkConfig::for_testing());

        first.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut server.events, EventKind::PeerConnected).await;
        assert_eq!(server.node.peer_count(), 1);

        // The dialer's side of the TCP handshake succeeds; the server then
        // drops the connection.
        let server_id = second.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut second_events, EventKind::PeerConnected).await;
        let dropped = next_signal(&mut second_events).await;
        assert_eq!(dropped.kind(), EventKind::PeerDisconnected);
        assert_eq!(dropped.origin(), Some(&server_id));

        assert_quiet(&mut server.events).await;
        assert_eq!(server.node.peer_count(), 1);
    }

    #[tokio::test]
    async fn test_slot_frees_after_disconnect() {
        let mut server = listening_node(NetworkConfig::for_testing().with_max_peers(1)).await;
        let (first, _first_events) = dialing_node(NetworkConfig::for_testing());
        let (second, _second_events) = dialing_node(NetworkConfig::for_testing());

        first.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut server.events, EventKind::PeerConnected).await;
        first.close().await.unwrap();
        next_of_kind(&mut server.events, EventKind::PeerDisconnected).await;
        assert_eq!(server.node.peer_count(), 0);

        second.dial(&server.addr.to_string()).await.unwrap();
        next_of_kind(&mut server.events, EventKind::PeerConnected).await;
        assert_eq!(server.node.peer_count(), 1);
    }

    #[tokio::test]
    async fn test_many_dialers_never_overshoot() {
        let max_peers = 3;
        let server = listening_node(NetworkConfig::for_testing().with_max_peers(max_peers)).await;

        let mut dialers = Vec::new();
        for _ in 0..8 {
            let (client, events) = dialing_node(NetworkConfig::for_testing());
            let target = server.addr.to_string();
            dialers.push(tokio::spawn(async move {
                let _ = client.dial(&target).await;
                (client, events)
            }));
        }
        let mut clients = Vec::new();
        for dialer in dialers {
            clients.push(dialer.await.unwrap());
        }

        wait_until(|| server.node.peer_count() == max_peers).await;
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(server.node.peer_count(), max_peers);
    }
}
