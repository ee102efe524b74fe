use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 响应文本清洗错误
    #[error("解析错误: {0}")]
    Sanitize(#[from] SanitizeError),
    /// 结构规范化错误
    #[error("结构错误: {0}")]
    Normalize(#[from] NormalizeError),
    /// 文档存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回结果为空
    #[error("LLM返回结果为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 图片解码或编码失败
    #[error("图片处理失败 ({path}): {source}")]
    ImageFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 响应文本清洗错误
///
/// 修复后仍无法解析即为终止错误，调用方记录并跳过该单元。
#[derive(Debug, Error)]
pub enum SanitizeError {
    /// 清洗后文本为空
    #[error("模型响应为空")]
    EmptyResponse,
    /// 修复一次后仍无法解析
    #[error("JSON解析失败 (已修复重试一次): {source}")]
    Unparseable {
        #[source]
        source: serde_json::Error,
        /// 最后一次尝试解析的文本
        text: String,
    },
}

/// 结构规范化错误
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// 顶层不是对象
    #[error("顶层 JSON 不是对象 (实际类型: {found})")]
    NotAnObject { found: &'static str },
}

/// 文档存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 文档ID不合法
    #[error("文档ID不合法: {id:?}")]
    InvalidDocumentId { id: String },
    /// 集合名不合法
    #[error("集合名不合法: {name:?}")]
    InvalidCollection { name: String },
    /// 文档内容不是对象
    #[error("文档 {collection}/{id} 内容不是 JSON 对象")]
    NotAnObject { collection: String, id: String },
    /// 请求失败
    #[error("存储请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回错误状态
    #[error("存储返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 缺少配置
    #[error("存储缺少配置项: {key}")]
    MissingSetting { key: &'static str },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 未知的存储后端
    #[error("未知的存储后端: {name} (可选: local, firestore)")]
    UnknownStoreBackend { name: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建存储请求错误
    pub fn store_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Store(StoreError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_wraps_inner_message() {
        let err: AppError = NormalizeError::NotAnObject { found: "array" }.into();
        assert_eq!(err.to_string(), "结构错误: 顶层 JSON 不是对象 (实际类型: array)");
    }

    #[test]
    fn test_source_chain_is_kept() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = AppError::file_read_failed("a.json", io);
        let source = std::error::Error::source(&err).expect("file error");
        assert!(source.to_string().contains("a.json"));
    }
}
