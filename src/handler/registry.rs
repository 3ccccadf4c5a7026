//! Proxy registry for dispatching packets by device key.
//!
//! The registry maps `(device_type, device_id)` to a shared proxy handle.
//! It is read by the receive loop and written by callers registering
//! devices, so every access goes through one `RwLock`. Lookups clone the
//! `Arc` out of the lock; proxy methods never run while the lock is held.
//!
//! # Example
//!
//! ```ignore
//! use amber_client::handler::ProxyRegistry;
//! use std::sync::Arc;
//!
//! let registry = ProxyRegistry::new();
//! registry.register(5, 2, Arc::new(my_proxy));
//! assert!(registry.get(DeviceKey::new(5, 2)).is_some());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::DeviceProxy;
use crate::protocol::DeviceKey;

/// Concurrent map from device key to proxy.
pub struct ProxyRegistry {
    proxies: RwLock<HashMap<DeviceKey, Arc<dyn DeviceProxy>>>,
}

impl ProxyRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            proxies: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<DeviceKey, Arc<dyn DeviceProxy>>> {
        self.proxies.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<DeviceKey, Arc<dyn DeviceProxy>>> {
        self.proxies.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a proxy, replacing any previous proxy for the same key.
    ///
    /// Returns the replaced proxy, if any.
    pub fn register(
        &self,
        device_type: u32,
        device_id: u32,
        proxy: Arc<dyn DeviceProxy>,
    ) -> Option<Arc<dyn DeviceProxy>> {
        self.write()
            .insert(DeviceKey::new(device_type, device_id), proxy)
    }

    /// Remove the proxy for a key.
    pub fn unregister(&self, device_type: u32, device_id: u32) -> Option<Arc<dyn DeviceProxy>> {
        self.write().remove(&DeviceKey::new(device_type, device_id))
    }

    /// Get the proxy for a key.
    pub fn get(&self, key: DeviceKey) -> Option<Arc<dyn DeviceProxy>> {
        self.read().get(&key).cloned()
    }

    /// Check if a key is registered.
    pub fn contains(&self, key: DeviceKey) -> bool {
        self.read().contains_key(&key)
    }

    /// Snapshot of all registered proxies.
    pub fn proxies(&self) -> Vec<Arc<dyn DeviceProxy>> {
        self.read().values().cloned().collect()
    }

    /// Number of registered proxies.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for ProxyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Packet;

    struct KeyedProxy {
        key: DeviceKey,
    }

    impl KeyedProxy {
        fn new(device_type: u32, device_id: u32) -> Arc<Self> {
            Arc::new(Self {
                key: DeviceKey::new(device_type, device_id),
            })
        }
    }

    impl DeviceProxy for KeyedProxy {
        fn device_type(&self) -> u32 {
            self.key.device_type
        }

        fn device_id(&self) -> u32 {
            self.key.device_id
        }

        fn handle_data(&self, _packet: &Packet) {}
    }

    #[test]
    fn test_register_and_get() {
        let registry = ProxyRegistry::new();
        assert!(registry.is_empty());

        let previous = registry.register(5, 2, KeyedProxy::new(5, 2));
        assert!(previous.is_none());

        let proxy = registry.get(DeviceKey::new(5, 2)).unwrap();
        assert_eq!(proxy.device_key(), DeviceKey::new(5, 2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ProxyRegistry::new();
        let first = KeyedProxy::new(5, 2);
        let second = KeyedProxy::new(5, 2);

        registry.register(5, 2, first.clone());
        let replaced = registry.register(5, 2, second.clone()).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&replaced, &(first as Arc<dyn DeviceProxy>)));
        let current = registry.get(DeviceKey::new(5, 2)).unwrap();
        assert!(Arc::ptr_eq(&current, &(second as Arc<dyn DeviceProxy>)));
    }

    #[test]
    fn test_keys_are_pairs() {
        let registry = ProxyRegistry::new();
        registry.register(5, 2, KeyedProxy::new(5, 2));
        registry.register(5, 3, KeyedProxy::new(5, 3));
        registry.register(2, 5, KeyedProxy::new(2, 5));

        assert_eq!(registry.len(), 3);
        assert!(registry.contains(DeviceKey::new(2, 5)));
        assert!(!registry.contains(DeviceKey::new(3, 5)));
    }

    #[test]
    fn test_unregister() {
        let registry = ProxyRegistry::new();
        registry.register(1, 1, KeyedProxy::new(1, 1));

        assert!(registry.unregister(1, 1).is_some());
        assert!(registry.unregister(1, 1).is_none());
        assert!(registry.get(DeviceKey::new(1, 1)).is_none());
    }

    #[test]
    fn test_concurrent_register_and_lookup() {
        let registry = Arc::new(ProxyRegistry::new());

        let writers: Vec<_> = (0..4u32)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for id in 0..100u32 {
                        registry.register(t + 1, id, KeyedProxy::new(t + 1, id));
                    }
                })
            })
            .collect();

        let reader = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for id in 0..100u32 {
                    if let Some(proxy) = registry.get(DeviceKey::new(1, id)) {
                        assert_eq!(proxy.device_id(), id);
                    }
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();

        assert_eq!(registry.len(), 400);
        assert_eq!(registry.proxies().len(), 400);
    }
}
