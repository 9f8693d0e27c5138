//! In-memory storage for the last successfully fetched remote configuration.
//!
//! [`ConfigurationStore`] is shared between the client façade and its background fetch tasks.
//! The snapshot itself is immutable and is only ever replaced whole, so readers never observe a
//! partially updated configuration.
use std::sync::Arc;

use tokio::sync::watch;

use crate::Flags;

/// Current configuration snapshot. `None` means "unknown": nothing fetched yet, or the last fetch
/// failed.
pub type Snapshot = Option<Arc<Flags>>;

/// A thread-safe (`Sync`) slot holding the current configuration, with replay-latest
/// subscriptions.
///
/// New subscribers see the current value immediately and are then notified of every
/// replacement.
pub struct ConfigurationStore {
    configuration: watch::Sender<Snapshot>,
}

impl Default for ConfigurationStore {
    fn default() -> Self {
        ConfigurationStore {
            configuration: watch::Sender::new(None),
        }
    }
}

impl ConfigurationStore {
    /// Create a new empty configuration store.
    pub fn new() -> Self {
        ConfigurationStore::default()
    }

    /// Get currently active configuration. Returns `None` if configuration hasn't been fetched
    /// yet or the last fetch failed.
    pub fn get_configuration(&self) -> Snapshot {
        self.configuration.borrow().clone()
    }

    /// Replace the current configuration, returning the previous one.
    pub fn set_configuration(&self, flags: impl Into<Arc<Flags>>) -> Snapshot {
        // Constructing new value before touching the channel to minimize lock span.
        let new_value = Some(flags.into());
        self.configuration.send_replace(new_value)
    }

    /// Forget the current configuration, returning the previous one.
    pub fn clear(&self) -> Snapshot {
        self.configuration.send_replace(None)
    }

    /// Subscribe to configuration changes.
    ///
    /// The receiver's current value is the configuration at the time of the call; use
    /// [`watch::Receiver::changed`] to wait for the next replacement.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.configuration.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use super::ConfigurationStore;

    fn flags(key: &str, value: &str) -> HashMap<String, String> {
        [(key.to_owned(), value.to_owned())].into()
    }

    #[test]
    fn starts_unknown() {
        let store = ConfigurationStore::new();
        assert!(store.get_configuration().is_none());
    }

    #[test]
    fn fetched_empty_is_distinct_from_unknown() {
        let store = ConfigurationStore::new();
        store.set_configuration(HashMap::new());

        let snapshot = store.get_configuration().unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn set_replaces_without_merging() {
        let store = ConfigurationStore::new();
        store.set_configuration(flags("a", "1"));
        let previous = store.set_configuration(flags("b", "2"));

        assert_eq!(*previous.unwrap(), flags("a", "1"));
        assert_eq!(*store.get_configuration().unwrap(), flags("b", "2"));
    }

    #[test]
    fn clear_forgets_configuration() {
        let store = ConfigurationStore::new();
        store.set_configuration(flags("a", "1"));
        store.clear();

        assert!(store.get_configuration().is_none());
    }

    #[test]
    fn can_set_configuration_from_another_thread() {
        let store = Arc::new(ConfigurationStore::new());

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || {
                store.set_configuration(HashMap::new());
            })
            .join();
        }

        assert!(store.get_configuration().is_some());
    }

    #[tokio::test]
    async fn subscribers_replay_latest_then_follow_updates() {
        let store = ConfigurationStore::new();
        store.set_configuration(flags("theme", "dark"));

        let mut receiver = store.subscribe();
        assert_eq!(
            receiver.borrow_and_update().as_deref(),
            Some(&flags("theme", "dark"))
        );

        store.clear();
        receiver.changed().await.unwrap();
        assert!(receiver.borrow_and_update().is_none());

        store.set_configuration(flags("theme", "light"));
        receiver.changed().await.unwrap();
        assert_eq!(
            receiver.borrow().as_deref(),
            Some(&flags("theme", "light"))
        );
    }
}
