use crate::backend::Backend;
use crate::error::Error;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default, Debug)]
pub struct InMemoryBackend {
    records: RwLock<BTreeMap<String, String>>,
}

impl InMemoryBackend {
    pub fn from_records(records: BTreeMap<String, String>) -> Self {
        InMemoryBackend {
            records: RwLock::new(records),
        }
    }

    pub async fn get(&self, domain: &str) -> Option<String> {
        self.records.read().await.get(domain).cloned()
    }

    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.records.read().await.clone()
    }
}

#[async_trait::async_trait]
impl Backend for InMemoryBackend {
    async fn update(&self, domain: &str, address: &str) -> Result<(), Error> {
        apply_update(&mut *self.records.write().await, domain, address);
        Ok(())
    }
}

/// Set `domain` to `address` in `records`, or remove it when `address` is empty.
pub(crate) fn apply_update(records: &mut BTreeMap<String, String>, domain: &str, address: &str) {
    if address.is_empty() {
        records.remove(domain);
    } else if records.get(domain).map(String::as_str) != Some(address) {
        records.insert(domain.to_string(), address.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeated_update_leaves_one_record() {
        let backend = InMemoryBackend::default();
        backend.update("home.example.com", "192.0.2.1").await.unwrap();
        backend.update("home.example.com", "192.0.2.1").await.unwrap();
        let records = backend.snapshot().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records["home.example.com"], "192.0.2.1");
    }

    #[tokio::test]
    async fn update_replaces_address() {
        let backend = InMemoryBackend::default();
        backend.update("home.example.com", "192.0.2.1").await.unwrap();
        backend.update("home.example.com", "192.0.2.2").await.unwrap();
        assert_eq!(
            backend.get("home.example.com").await.as_deref(),
            Some("192.0.2.2")
        );
    }

    #[tokio::test]
    async fn empty_address_removes_record() {
        let backend = InMemoryBackend::default();
        backend.update("home.example.com", "192.0.2.1").await.unwrap();
        backend.update("home.example.com", "").await.unwrap();
        assert_eq!(backend.get("home.example.com").await, None);
        // Removing again is not an error.
        backend.update("home.example.com", "").await.unwrap();
    }
}
