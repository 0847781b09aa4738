//! # Identity Collisions
//!
//! Peers are identified by remote address. A second connection claiming an
//! identity already in the table replaces the first: the earlier connection
//! is closed and the table keeps exactly one entry.

#[cfg(test)]
mod tests {
    use super::super::*;
    use mesh_network::test_utils::MockConnection;
    use mesh_network::{ConnectionDirection, EventKind, NetworkConfig, PeerId};
    use std::net::SocketAddr;

    fn remote() -> SocketAddr {
        "10.1.2.3:7000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_newer_connection_replaces_older() {
        let (node, mut events) = dialing_node(NetworkConfig::for_testing());
        let id = PeerId::from_remote(remote());

        let (old_conn, old) = MockConnection::pair(remote());
        node.establish(Box::new(old_conn), ConnectionDirection::Inbound)
            .await
            .unwrap();
        next_of_kind(&mut events, EventKind::PeerConnected).await;

        let (new_conn, new) = MockConnection::pair(remote());
        let admitted = node
            .establish(Box::new(new_conn), ConnectionDirection::Outbound)
            .await
            .unwrap();
        assert_eq!(admitted.id(), &id);
        assert!(old.is_closed());
        assert!(!new.is_closed());

        // The displaced worker still reports its own connection ending.
        let gone = next_of_kind(&mut events, EventKind::PeerDisconnected).await;
        assert_eq!(gone.origin(), Some(&id));

        assert_eq!(node.peer_count(), 1);
        assert_eq!(node.table()[0].direction, ConnectionDirection::Outbound);

        node.send_message(&id, b"to the new one").await.unwrap();
        assert_eq!(new.sent(), vec![b"to the new one".to_vec()]);
        assert!(old.sent().is_empty());
    }

    #[tokio::test]
    async fn test_replacement_does_not_count_against_max_peers() {
        let (node, _events) = dialing_node(NetworkConfig::for_testing().with_max_peers(1));

        let (first, _first) = MockConnection::pair(remote());
        node.establish(Box::new(first), ConnectionDirection::Inbound)
            .await
            .unwrap();

        let (again, _again) = MockConnection::pair(remote());
        node.establish(Box::new(again), ConnectionDirection::Inbound)
            .await
            .unwrap();

        let other: SocketAddr = "10.1.2.4:7000".parse().unwrap();
        let (third, third_handle) = MockConnection::pair(other);
        let rejected = node
            .establish(Box::new(third), ConnectionDirection::Inbound)
            .await
            .unwrap_err();
        assert!(rejected.is_admission_rejected());
        assert!(third_handle.is_closed());
        assert_eq!(node.peer_count(), 1);
    }

    #[tokio::test]
    async fn test_messages_after_replacement_carry_same_origin() {
        let (node, mut events) = dialing_node(NetworkConfig::for_testing());
        let id = PeerId::from_remote(remote());

        let (old_conn, _old) = MockConnection::pair(remote());
        node.establish(Box::new(old_conn), ConnectionDirection::Inbound)
            .await
            .unwrap();
        let (new_conn, new) = MockConnection::pair(remote());
        node.establish(Box::new(new_conn), ConnectionDirection::Inbound)
            .await
            .unwrap();

        new.push(b"fresh".to_vec());
        let message = next_of_kind(&mut events, EventKind::MessageReceived).await;
        assert_eq!(message.origin(), Some(&id));
        assert_eq!(message.payload(), b"fresh");
    }
}
