//! Durable document store.
//!
//! Both catalogs (local backup catalog and simulated cloud ledger) follow
//! the same pattern: one JSON document on disk, loaded fully into memory
//! and rewritten in full on every change. The store owns a mutex so the
//! load-mutate-persist cycle is serialized across concurrent callers;
//! without it two concurrent appends race and one entry is lost.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

pub struct DocumentStore<D> {
    path: PathBuf,
    doc: Mutex<D>,
}

impl<D> DocumentStore<D>
where
    D: Serialize + DeserializeOwned,
{
    /// Open the document at `path`, initializing and persisting it with
    /// `init` when absent. A present but unreadable document is
    /// reinitialized with a loud warning rather than failing the open:
    /// the engine must keep taking backups even after metadata damage.
    pub fn open(path: PathBuf, init: impl FnOnce() -> D) -> Result<Self> {
        let doc = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(
                        "Document {} is corrupt ({}); reinitializing empty — previously recorded entries are lost",
                        path.display(),
                        e
                    );
                    let doc = init();
                    persist(&path, &doc)?;
                    doc
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let doc = init();
                persist(&path, &doc)?;
                doc
            }
            Err(e) => return Err(e.into()),
        };

        Ok(DocumentStore {
            path,
            doc: Mutex::new(doc),
        })
    }

    /// Mutate the document under the store lock and persist it in full.
    /// The lock is held for the whole cycle.
    pub async fn update<R>(&self, mutate: impl FnOnce(&mut D) -> R) -> Result<R> {
        let mut doc = self.doc.lock().await;
        let out = mutate(&mut doc);
        persist(&self.path, &*doc)?;
        Ok(out)
    }

    /// Read the document under the store lock.
    pub async fn read<R>(&self, view: impl FnOnce(&D) -> R) -> R {
        let doc = self.doc.lock().await;
        view(&doc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write the whole document to a temp sibling and rename it into place,
/// so a torn write never clobbers the previous version.
fn persist<D: Serialize>(path: &Path, doc: &D) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.json".to_string());
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    let raw = serde_json::to_vec_pretty(doc)?;
    std::fs::write(&tmp, &raw)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
    struct Doc {
        items: Vec<String>,
    }

    #[tokio::test]
    async fn open_initializes_missing_document() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("doc.json");

        let store = DocumentStore::open(path.clone(), Doc::default)?;
        assert!(path.exists());
        assert_eq!(store.read(|d: &Doc| d.items.len()).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn update_persists_and_survives_reopen() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("doc.json");

        let store = DocumentStore::open(path.clone(), Doc::default)?;
        store
            .update(|d| d.items.push("first".to_string()))
            .await?;
        drop(store);

        let store = DocumentStore::open(path, Doc::default)?;
        assert_eq!(store.read(|d| d.items.clone()).await, vec!["first"]);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_document_is_reinitialized() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("doc.json");
        std::fs::write(&path, b"{ not json")?;

        let store = DocumentStore::open(path.clone(), Doc::default)?;
        assert_eq!(store.read(|d: &Doc| d.items.len()).await, 0);

        // The reinitialized document was persisted immediately
        let raw = std::fs::read_to_string(&path)?;
        let doc: Doc = serde_json::from_str(&raw)?;
        assert_eq!(doc, Doc::default());
        Ok(())
    }
}
