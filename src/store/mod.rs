//! 文档存储 - 基础设施层
//!
//! 只暴露键值文档能力：`set` / `get_all` / `delete` / `collections`，
//! 不认识评分标准结构。
//!
//! - `LocalDocumentStore`：本地目录，每个集合一个子目录，每个文档一个 JSON 文件
//! - `FirestoreStore`：Firestore REST v1

pub mod firestore;
pub mod firestore_value;
pub mod local;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{AppResult, ConfigError, StoreError};

pub use firestore::FirestoreStore;
pub use local::LocalDocumentStore;

/// 存储中的一个文档
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

/// 文档存储边界
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// 写入（覆盖）文档
    async fn set(&self, collection: &str, document_id: &str, value: &Map<String, Value>) -> Result<()>;

    /// 读取集合中的全部文档
    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>>;

    /// 删除文档
    async fn delete(&self, collection: &str, document_id: &str) -> Result<()>;

    /// 列出所有集合
    async fn collections(&self) -> Result<Vec<String>>;
}

/// 检查文档ID（集合名同理）能否安全地用作路径片段
pub fn validate_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(|c: char| c == '/' || c == '\\')
}

pub(crate) fn check_document_id(id: &str) -> Result<(), StoreError> {
    if validate_segment(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidDocumentId { id: id.to_string() })
    }
}

pub(crate) fn check_collection(name: &str) -> Result<(), StoreError> {
    if validate_segment(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection {
            name: name.to_string(),
        })
    }
}

/// 命令行可选的存储后端
pub enum StoreBackend {
    Local(LocalDocumentStore),
    Firestore(FirestoreStore),
}

impl StoreBackend {
    /// 按名称（`local` / `firestore`）创建存储后端
    pub fn from_config(name: &str, config: &Config) -> AppResult<Self> {
        match name {
            "local" => Ok(StoreBackend::Local(LocalDocumentStore::new(&config.store_dir))),
            "firestore" => Ok(StoreBackend::Firestore(FirestoreStore::from_config(config)?)),
            other => Err(ConfigError::UnknownStoreBackend {
                name: other.to_string(),
            }
            .into()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StoreBackend::Local(store) => format!("本地存储 ({})", store.root().display()),
            StoreBackend::Firestore(store) => format!("Firestore ({})", store.project_id()),
        }
    }
}

impl DocumentStore for StoreBackend {
    async fn set(&self, collection: &str, document_id: &str, value: &Map<String, Value>) -> Result<()> {
        match self {
            StoreBackend::Local(store) => store.set(collection, document_id, value).await,
            StoreBackend::Firestore(store) => store.set(collection, document_id, value).await,
        }
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        match self {
            StoreBackend::Local(store) => store.get_all(collection).await,
            StoreBackend::Firestore(store) => store.get_all(collection).await,
        }
    }

    async fn delete(&self, collection: &str, document_id: &str) -> Result<()> {
        match self {
            StoreBackend::Local(store) => store.delete(collection, document_id).await,
            StoreBackend::Firestore(store) => store.delete(collection, document_id).await,
        }
    }

    async fn collections(&self) -> Result<Vec<String>> {
        match self {
            StoreBackend::Local(store) => store.collections().await,
            StoreBackend::Firestore(store) => store.collections().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("2019 Paper 1"));
        assert!(validate_segment("mark-schemes"));
        assert!(!validate_segment(""));
        assert!(!validate_segment(".."));
        assert!(!validate_segment("a/b"));
        assert!(!validate_segment("a\\b"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let err = StoreBackend::from_config("mongo", &Config::default()).err().unwrap();
        assert!(err.to_string().contains("mongo"));
    }

    #[test]
    fn test_firestore_backend_needs_project() {
        assert!(StoreBackend::from_config("firestore", &Config::default()).is_err());
    }
}
