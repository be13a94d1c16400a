use crate::connection::ConnectionRef;
use crate::errors::BrokerError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Directory of live streams, keyed by `"{app}/{stream_name}"`.
///
/// At most one publisher exists per stream key; subscribers form an ordered
/// group that fan-out iterates over a snapshot of, so connections joining
/// or leaving mid-frame are picked up on the next frame.
///
/// One registry is shared (via `Arc`) by every dispatcher of a broker
/// instance; tests build their own.
pub struct StreamRegistry {
    publishers: RwLock<HashMap<String, ConnectionRef>>,
    subscribers: RwLock<HashMap<String, Vec<ConnectionRef>>>,
}

impl StreamRegistry {
    pub fn new() -> StreamRegistry {
        StreamRegistry {
            publishers: RwLock::new(HashMap::new()),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Claims a stream key for a publisher connection.
    pub fn register_publisher(
        &self,
        stream_key: &str,
        connection: ConnectionRef,
    ) -> Result<(), BrokerError> {
        let mut publishers = self.publishers.write();
        if publishers.contains_key(stream_key) {
            return Err(BrokerError::StreamKeyInUse(stream_key.to_string()));
        }

        publishers.insert(stream_key.to_string(), connection);
        Ok(())
    }

    /// Removes a publisher entry, but only if it still belongs to the given
    /// connection.  A late teardown of a replaced publisher must not
    /// clobber the current one.
    pub fn remove_publisher(&self, stream_key: &str, connection: &ConnectionRef) {
        let mut publishers = self.publishers.write();
        if publishers
            .get(stream_key)
            .map(|registered| registered.id())
            == Some(connection.id())
        {
            publishers.remove(stream_key);
        }
    }

    pub fn lookup_publisher(&self, stream_key: &str) -> Option<ConnectionRef> {
        self.publishers.read().get(stream_key).cloned()
    }

    /// Adds a subscriber to the group for a stream key, creating the group
    /// lazily.  Adding the same connection twice is a no-op.
    pub fn add_subscriber(&self, stream_key: &str, connection: ConnectionRef) {
        let mut groups = self.subscribers.write();
        let group = groups.entry(stream_key.to_string()).or_default();
        if !group.iter().any(|member| member.id() == connection.id()) {
            group.push(connection);
        }
    }

    /// Removes a subscriber; safe when it was never added.  The group is
    /// dropped once its last member leaves.
    pub fn remove_subscriber(&self, stream_key: &str, connection: &ConnectionRef) {
        let mut groups = self.subscribers.write();
        if let Some(group) = groups.get_mut(stream_key) {
            group.retain(|member| member.id() != connection.id());
            if group.is_empty() {
                groups.remove(stream_key);
            }
        }
    }

    /// The subscriber group as of this instant.  Mutations after the
    /// snapshot is taken are not observed by the caller's iteration.
    pub fn subscribers_snapshot(&self, stream_key: &str) -> Vec<ConnectionRef> {
        self.subscribers
            .read()
            .get(stream_key)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        StreamRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::StreamRegistry;
    use crate::connection::ConnectionRef;
    use crate::errors::BrokerError;
    use crate::test_utils::TestConnection;

    #[test]
    fn only_one_publisher_per_stream_key() {
        let registry = StreamRegistry::new();
        let first: ConnectionRef = TestConnection::create(1);
        let second: ConnectionRef = TestConnection::create(2);

        registry.register_publisher("live/cam1", first.clone()).unwrap();
        let result = registry.register_publisher("live/cam1", second);

        assert!(matches!(result, Err(BrokerError::StreamKeyInUse(key)) if key == "live/cam1"));
        assert_eq!(registry.lookup_publisher("live/cam1").unwrap().id(), 1);
    }

    #[test]
    fn publisher_removal_is_identity_guarded() {
        let registry = StreamRegistry::new();
        let current: ConnectionRef = TestConnection::create(1);
        let stale: ConnectionRef = TestConnection::create(2);

        registry
            .register_publisher("live/cam1", current.clone())
            .unwrap();
        registry.remove_publisher("live/cam1", &stale);
        assert!(registry.lookup_publisher("live/cam1").is_some());

        registry.remove_publisher("live/cam1", &current);
        assert!(registry.lookup_publisher("live/cam1").is_none());
    }

    #[test]
    fn subscriber_add_is_idempotent() {
        let registry = StreamRegistry::new();
        let subscriber: ConnectionRef = TestConnection::create(1);

        registry.add_subscriber("live/cam1", subscriber.clone());
        registry.add_subscriber("live/cam1", subscriber);

        assert_eq!(registry.subscribers_snapshot("live/cam1").len(), 1);
    }

    #[test]
    fn subscriber_group_preserves_join_order() {
        let registry = StreamRegistry::new();
        for id in [3, 1, 2] {
            let subscriber: ConnectionRef = TestConnection::create(id);
            registry.add_subscriber("live/cam1", subscriber);
        }

        let ids: Vec<u64> = registry
            .subscribers_snapshot("live/cam1")
            .iter()
            .map(|member| member.id())
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn removing_last_subscriber_drops_the_group() {
        let registry = StreamRegistry::new();
        let subscriber: ConnectionRef = TestConnection::create(1);

        registry.add_subscriber("live/cam1", subscriber.clone());
        registry.remove_subscriber("live/cam1", &subscriber);

        assert!(registry.subscribers_snapshot("live/cam1").is_empty());
        assert!(!registry.subscribers.read().contains_key("live/cam1"));
    }

    #[test]
    fn removing_unknown_subscriber_is_safe() {
        let registry = StreamRegistry::new();
        let subscriber: ConnectionRef = TestConnection::create(1);

        registry.remove_subscriber("live/cam1", &subscriber);
    }

    #[test]
    fn snapshot_does_not_observe_later_mutations() {
        let registry = StreamRegistry::new();
        let first: ConnectionRef = TestConnection::create(1);
        registry.add_subscriber("live/cam1", first);

        let snapshot = registry.subscribers_snapshot("live/cam1");

        let second: ConnectionRef = TestConnection::create(2);
        registry.add_subscriber("live/cam1", second);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.subscribers_snapshot("live/cam1").len(), 2);
    }
}
