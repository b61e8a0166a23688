#![forbid(unsafe_code)]

//! Key manager with named key store.

use crate::key::{Key, KeyUsage};
use ulriksdal_core::Error;

/// A collection of keys looked up by name or usage.
#[derive(Debug, Clone, Default)]
pub struct KeysManager {
    keys: Vec<Key>,
}

impl KeysManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name.as_deref() == Some(name))
    }

    /// Find the first key whose usage permits `usage`.
    pub fn find_by_usage(&self, usage: KeyUsage) -> Option<&Key> {
        self.keys.iter().find(|k| k.usage.permits(usage))
    }

    /// Find the first key holding private material.
    pub fn find_private(&self) -> Option<&Key> {
        self.keys.iter().find(|k| k.has_private())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    /// Get the first key available (for simple single-key scenarios).
    pub fn first_key(&self) -> Result<&Key, Error> {
        self.keys
            .first()
            .ok_or_else(|| Error::KeyNotFound("no keys in manager".into()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyData;

    #[test]
    fn test_lookup() {
        let mut manager = KeysManager::new();
        assert!(matches!(manager.first_key(), Err(Error::KeyNotFound(_))));

        manager.add_key(Key::new(KeyData::Hmac(vec![1; 16]), KeyUsage::Encryption).with_name("enc"));
        manager.add_key(Key::new(KeyData::Hmac(vec![2; 16]), KeyUsage::Signing).with_name("sig"));

        assert_eq!(manager.len(), 2);
        assert!(manager.find_by_name("sig").is_some());
        assert!(manager.find_by_name("nope").is_none());
        assert_eq!(
            manager.find_by_usage(KeyUsage::Signing).and_then(|k| k.name.as_deref()),
            Some("sig")
        );
        assert_eq!(manager.first_key().unwrap().name.as_deref(), Some("enc"));
    }
}
