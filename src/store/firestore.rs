//! Firestore 文档存储（REST v1）
//!
//! 使用 Bearer 访问令牌，文档以类型化 `fields` 读写，
//! 转换规则见 [`super::firestore_value`]。

use anyhow::Result;
use reqwest::{Method, StatusCode, Url};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::firestore_value::{decode_fields, encode_fields};
use super::{check_collection, check_document_id, DocumentStore, StoredDocument};
use crate::config::Config;
use crate::error::{AppError, AppResult, StoreError};

const PAGE_SIZE: u32 = 300;

pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    access_token: String,
}

impl FirestoreStore {
    /// 从配置创建，项目ID和访问令牌缺一不可
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let project_id = config
            .firestore_project_id
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(StoreError::MissingSetting {
                key: "firestore_project_id",
            })?;
        let access_token = config
            .firestore_access_token
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(StoreError::MissingSetting {
                key: "firestore_access_token",
            })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.firestore_base_url.trim_end_matches('/').to_string(),
            project_id,
            access_token,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    /// `…/documents/<segments…>`，每个片段单独做百分号编码
    fn documents_url(&self, segments: &[&str]) -> AppResult<Url> {
        let root = self.documents_root();
        let mut url = Url::parse(&root).map_err(|e| AppError::store_request_failed(&root, e))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Other(format!("无法拼接 URL: {}", root)))?
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> AppResult<Value> {
        let endpoint = format!("{} {}", method, url);
        debug!("Firestore 请求: {}", endpoint);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::store_request_failed(&endpoint, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::store_request_failed(&endpoint, e))?;

        if !status.is_success() {
            return Err(StoreError::BadResponse {
                endpoint,
                status: status.as_u16(),
                body: text,
            }
            .into());
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| AppError::store_request_failed(endpoint, e))
    }
}

/// 取文档资源名的最后一段作为文档ID
pub(crate) fn parse_document(doc: &Value) -> Option<StoredDocument> {
    let name = doc.get("name")?.as_str()?;
    let id = name.rsplit('/').next()?.to_string();
    let data = doc
        .get("fields")
        .and_then(Value::as_object)
        .map(decode_fields)
        .unwrap_or_default();
    Some(StoredDocument { id, data })
}

fn next_page_token(page: &Value) -> Option<String> {
    page.get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl DocumentStore for FirestoreStore {
    async fn set(&self, collection: &str, document_id: &str, value: &Map<String, Value>) -> Result<()> {
        check_collection(collection)?;
        check_document_id(document_id)?;
        let url = self.documents_url(&[collection, document_id])?;
        self.send(Method::PATCH, url, Some(json!({ "fields": encode_fields(value) })))
            .await?;
        Ok(())
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        check_collection(collection)?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.documents_url(&[collection])?;
            url.query_pairs_mut()
                .append_pair("pageSize", &PAGE_SIZE.to_string());
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page = self.send(Method::GET, url, None).await?;
            if let Some(docs) = page.get("documents").and_then(Value::as_array) {
                documents.extend(docs.iter().filter_map(parse_document));
            }

            page_token = next_page_token(&page);
            if page_token.is_none() {
                break;
            }
        }

        Ok(documents)
    }

    async fn delete(&self, collection: &str, document_id: &str) -> Result<()> {
        check_collection(collection)?;
        check_document_id(document_id)?;
        let url = self.documents_url(&[collection, document_id])?;
        match self.send(Method::DELETE, url, None).await {
            Ok(_) => Ok(()),
            // 文档本就不存在
            Err(AppError::Store(StoreError::BadResponse { status, .. }))
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn collections(&self) -> Result<Vec<String>> {
        let endpoint = format!("{}:listCollectionIds", self.documents_root());
        let url = Url::parse(&endpoint).map_err(|e| AppError::store_request_failed(&endpoint, e))?;
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut body = json!({ "pageSize": PAGE_SIZE });
            if let Some(token) = &page_token {
                body["pageToken"] = json!(token);
            }

            let page = self.send(Method::POST, url.clone(), Some(body)).await?;
            if let Some(ids) = page.get("collectionIds").and_then(Value::as_array) {
                names.extend(ids.iter().filter_map(Value::as_str).map(str::to_string));
            }

            page_token = next_page_token(&page);
            if page_token.is_none() {
                break;
            }
        }

        Ok(names)
    }
}
