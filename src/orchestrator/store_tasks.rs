//! 存储任务 - 编排层
//!
//! 在 JSON 文件和文档存储之间搬运评分标准：
//! - `import_combined`：合并输出文件 → 集合
//! - `upload_documents`：带 `docId` 的对象数组 → 集合
//! - `download_all`：所有集合 → 一个 JSON 文件
//! - `clear_all`：删除所有集合的所有文档
//!
//! 单个文档失败只记录日志，不中断任务。

use anyhow::{bail, Result};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::path::Path;
use tracing::{error, info, warn};

use crate::services::output_writer::{read_json_file, write_json_file};
use crate::store::DocumentStore;

/// 任务统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub deleted: usize,
}

impl Display for TaskReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "写入 {}, 跳过 {}, 失败 {}, 删除 {}",
            self.written, self.skipped, self.failed, self.deleted
        )
    }
}

/// 合并输出中的单元名 → 文档ID（`_` 换成空格，去掉 ` MS`）
///
/// `2019_Paper_1_MS` → `2019 Paper 1`
pub fn document_id_from_key(key: &str) -> String {
    key.replace('_', " ").replace(" MS", "")
}

/// 首字符为字母或 `_`，其余为字母、数字或 `_`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// 把合并输出文件导入集合
pub async fn import_combined<S: DocumentStore>(
    store: &S,
    path: &Path,
    collection: &str,
) -> Result<TaskReport> {
    info!("📥 正在导入: {}", path.display());
    let Value::Object(units) = read_json_file(path).await? else {
        bail!("合并文件顶层必须是 JSON 对象: {}", path.display());
    };

    let mut report = TaskReport::default();
    for (key, data) in &units {
        let document_id = document_id_from_key(key);
        let Value::Object(fields) = data else {
            warn!("⚠️ 文档 {} 不是 JSON 对象，跳过", document_id);
            report.skipped += 1;
            continue;
        };

        match store.set(collection, &document_id, fields).await {
            Ok(()) => {
                info!("✓ 文档 {} 已写入集合 {}", document_id, collection);
                report.written += 1;
            }
            Err(e) => {
                error!("❌ 文档 {} 写入失败: {:#}", document_id, e);
                report.failed += 1;
            }
        }
    }

    info!("📊 导入完成: {}", report);
    Ok(report)
}

/// 上传对象数组，每个对象用自身的 `docId` 作为文档ID
pub async fn upload_documents<S: DocumentStore>(
    store: &S,
    path: &Path,
    collection: &str,
) -> Result<TaskReport> {
    info!("📤 正在上传: {}", path.display());
    let Value::Array(items) = read_json_file(path).await? else {
        bail!("上传文件必须是 JSON 数组: {}", path.display());
    };

    let mut report = TaskReport::default();
    for (index, item) in items.into_iter().enumerate() {
        let (document_id, fields) = match split_doc_id(item) {
            Ok(pair) => pair,
            Err(reason) => {
                warn!("⚠️ 第 {} 个对象无效: {}，跳过", index + 1, reason);
                report.skipped += 1;
                continue;
            }
        };

        match store.set(collection, &document_id, &fields).await {
            Ok(()) => {
                info!("✓ 文档 {} 已写入集合 {}", document_id, collection);
                report.written += 1;
            }
            Err(e) => {
                error!("❌ 文档 {} 写入失败: {:#}", document_id, e);
                report.failed += 1;
            }
        }
    }

    info!("📊 上传完成: {}", report);
    Ok(report)
}

/// 取出并移除 `docId`
fn split_doc_id(item: Value) -> Result<(String, Map<String, Value>), String> {
    let Value::Object(mut fields) = item else {
        return Err("不是 JSON 对象".to_string());
    };
    match fields.shift_remove("docId") {
        Some(Value::String(id)) if is_identifier(&id) => Ok((id, fields)),
        Some(other) => Err(format!("docId {} 不是合法标识符", other)),
        None => Err("缺少 docId".to_string()),
    }
}

/// 下载所有集合，写成 `{集合名: [文档数据, ...]}`
pub async fn download_all<S: DocumentStore>(store: &S, path: &Path) -> Result<TaskReport> {
    let mut all = Map::new();
    let mut report = TaskReport::default();

    for collection in store.collections().await? {
        let documents = store.get_all(&collection).await?;
        info!("✓ 集合 {}: {} 个文档", collection, documents.len());
        report.written += documents.len();
        all.insert(
            collection,
            Value::Array(documents.into_iter().map(|d| Value::Object(d.data)).collect()),
        );
    }

    write_json_file(path, &all).await?;
    info!("✅ 所有数据已保存至 {}", path.display());
    Ok(report)
}

/// 删除所有集合的所有文档
pub async fn clear_all<S: DocumentStore>(store: &S) -> Result<TaskReport> {
    let mut report = TaskReport::default();

    for collection in store.collections().await? {
        match clear_collection(store, &collection).await {
            Ok(deleted) => {
                info!("✓ 集合 {} 已清空 ({} 个文档)", collection, deleted);
                report.deleted += deleted;
            }
            Err(e) => {
                error!("❌ 清空集合 {} 失败: {:#}", collection, e);
                report.failed += 1;
            }
        }
    }

    info!("📊 清空完成: {}", report);
    Ok(report)
}

async fn clear_collection<S: DocumentStore>(store: &S, collection: &str) -> Result<usize> {
    let documents = store.get_all(collection).await?;
    for document in &documents {
        info!("🗑️ 删除文档 {}/{}", collection, document.id);
        store.delete(collection, &document.id).await?;
    }
    Ok(documents.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalDocumentStore;
    use serde_json::json;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("msp-tasks-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_document_id_from_key() {
        assert_eq!(document_id_from_key("2019_Paper_1_MS"), "2019 Paper 1");
        assert_eq!(document_id_from_key("June_2020_P2"), "June 2020 P2");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("paper_2019"));
        assert!(is_identifier("_hidden"));
        assert!(!is_identifier("2019_paper"));
        assert!(!is_identifier("paper-1"));
        assert!(!is_identifier(""));
    }

    #[tokio::test]
    async fn test_import_renames_and_skips_non_objects() {
        let dir = scratch_dir("import");
        let file = dir.join("joint_mark_schemes.json");
        std::fs::write(
            &file,
            json!({"2019_P1_MS": {"1": []}, "notes": "text", "2020_P2_MS": {"2a": []}}).to_string(),
        )
        .unwrap();
        let store = LocalDocumentStore::new(dir.join("store"));

        let report = import_combined(&store, &file, "mark-schemes").await.unwrap();
        assert_eq!(report.written, 2);
        assert_eq!(report.skipped, 1);

        let ids: Vec<String> = store
            .get_all("mark-schemes")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["2019 P1", "2020 P2"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_upload_validates_doc_ids() {
        let dir = scratch_dir("upload");
        let file = dir.join("tailored.json");
        std::fs::write(
            &file,
            json!([
                {"docId": "paper_one", "1": []},
                {"docId": "2bad", "1": []},
                {"1": []},
                "not an object"
            ])
            .to_string(),
        )
        .unwrap();
        let store = LocalDocumentStore::new(dir.join("store"));

        let report = upload_documents(&store, &file, "mark-schemes").await.unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 3);

        let docs = store.get_all("mark-schemes").await.unwrap();
        assert_eq!(docs[0].id, "paper_one");
        assert!(!docs[0].data.contains_key("docId"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_upload_rejects_non_array() {
        let dir = scratch_dir("upload-object");
        let file = dir.join("tailored.json");
        std::fs::write(&file, "{\"docId\": \"x\"}").unwrap();
        let store = LocalDocumentStore::new(dir.join("store"));

        assert!(upload_documents(&store, &file, "mark-schemes").await.is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_download_then_clear() {
        let dir = scratch_dir("download");
        let store = LocalDocumentStore::new(dir.join("store"));
        let doc = json!({"1": []}).as_object().cloned().unwrap();
        store.set("mark-schemes", "a", &doc).await.unwrap();
        store.set("mark-schemes", "b", &doc).await.unwrap();
        store.set("users", "u", &doc).await.unwrap();

        let out = dir.join("out").join("all_firestore_data.json");
        let report = download_all(&store, &out).await.unwrap();
        assert_eq!(report.written, 3);
        assert_eq!(
            read_json_file(&out).await.unwrap(),
            json!({"mark-schemes": [{"1": []}, {"1": []}], "users": [{"1": []}]})
        );

        let report = clear_all(&store).await.unwrap();
        assert_eq!(report.deleted, 3);
        assert_eq!(report.failed, 0);
        assert!(store.collections().await.unwrap().is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
