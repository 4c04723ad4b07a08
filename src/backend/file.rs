//! A JSON file-backed implementation of the [`Backend`][super::Backend] trait.
//!
//! Wraps a [`InMemoryBackend`][super::memory::InMemoryBackend] instance, persisting
//! updates to a JSON file on disk that can be reloaded across restarts.
use crate::backend::memory::{apply_update, InMemoryBackend};
use crate::backend::Backend;
use crate::error::Error;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use tokio::fs::File;
use tokio::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

/// A file-backed record store. After each update a JSON file on disk is rewritten with the full
/// set of records, and the file is reloaded on startup.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct FileBackend {
    records: InMemoryBackend,
    path: String,
    // Serializes update + save so the file always reflects the latest update.
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Save the records as JSON to the backend's configured path, or return an Error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if the records can't be serialized to JSON.
    ///
    /// Returns [`Error::IO`] if the serialized records can't be written to the backing file path.
    pub async fn save(&self) -> Result<(), Error> {
        self.write_records(&self.records.snapshot().await).await
    }

    async fn write_records(&self, records: &BTreeMap<String, String>) -> Result<(), Error> {
        let data = serde_json::to_string_pretty(records)?;
        let mut output_file = File::create(&self.path).await?;
        output_file.write_all(data.as_bytes()).await?;
        output_file.flush().await?;
        Ok(())
    }

    /// Load a [`FileBackend`] from the JSON record state located at the given path, creating an
    /// empty state file if none exists, or return an Error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if the JSON state file is invalid.
    ///
    /// Returns [`Error::IO`] if the path can't be opened or read.
    pub async fn try_from_file(p: &str) -> Result<Self, Error> {
        let contents = match File::open(p).await {
            Ok(mut f) => {
                let mut buf = vec![];
                f.read_to_end(&mut buf).await?;
                buf
            }
            Err(err) => match err.kind() {
                ErrorKind::NotFound => Self::write_empty_state(File::create(&p).await?).await?,
                _ => return Err(Error::IO(err)),
            },
        };

        let records: BTreeMap<String, String> = serde_json::from_slice(&contents)?;
        tracing::debug!("loaded {} records from {p}", records.len());
        Ok(Self {
            records: InMemoryBackend::from_records(records),
            path: p.to_string(),
            write_lock: Mutex::default(),
        })
    }

    pub async fn get(&self, domain: &str) -> Option<String> {
        self.records.get(domain).await
    }

    async fn write_empty_state(mut f: File) -> io::Result<Vec<u8>> {
        let default_data = serde_json::to_string_pretty(&BTreeMap::<String, String>::new())?;
        let default_bytes = default_data.as_bytes();
        f.write_all(default_bytes).await?;
        f.flush().await?;
        Ok(default_bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl Backend for FileBackend {
    async fn update(&self, domain: &str, address: &str) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        // Memory only takes the change once it is on disk.
        let mut next = self.records.snapshot().await;
        apply_update(&mut next, domain, address);
        self.write_records(&next).await?;
        self.records.update(domain, address).await
    }
}
