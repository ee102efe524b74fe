//! 本地目录文档存储
//!
//! `<root>/<collection>/<document_id>.json`，集合的最后一个文档被删除后
//! 集合目录也一并删除。

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{check_collection, check_document_id, DocumentStore, StoredDocument};
use crate::error::StoreError;
use crate::services::output_writer::{read_json_file, write_json_file};

pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf> {
        check_collection(collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, document_id: &str) -> Result<PathBuf> {
        check_document_id(document_id)?;
        Ok(self
            .collection_dir(collection)?
            .join(format!("{}.json", document_id)))
    }
}

impl DocumentStore for LocalDocumentStore {
    async fn set(&self, collection: &str, document_id: &str, value: &Map<String, Value>) -> Result<()> {
        let path = self.document_path(collection, document_id)?;
        debug!("写入本地文档: {}", path.display());
        write_json_file(&path, value).await
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let dir = self.collection_dir(collection)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = fs::read_dir(&dir)
            .await
            .with_context(|| format!("无法读取集合目录: {}", dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let id = path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            match read_json_file(&path).await? {
                Value::Object(data) => documents.push(StoredDocument { id, data }),
                _ => {
                    return Err(StoreError::NotAnObject {
                        collection: collection.to_string(),
                        id,
                    }
                    .into())
                }
            }
        }

        Ok(documents)
    }

    async fn delete(&self, collection: &str, document_id: &str) -> Result<()> {
        let path = self.document_path(collection, document_id)?;
        if path.exists() {
            fs::remove_file(&path)
                .await
                .with_context(|| format!("无法删除文档: {}", path.display()))?;
        }

        let dir = self.collection_dir(collection)?;
        if dir.exists() && fs::read_dir(&dir).await?.next_entry().await?.is_none() {
            fs::remove_dir(&dir)
                .await
                .with_context(|| format!("无法删除空集合: {}", dir.display()))?;
        }

        Ok(())
    }

    async fn collections(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root)
            .await
            .with_context(|| format!("无法读取存储目录: {}", self.root.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();

        Ok(names)
    }
}
