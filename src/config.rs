//! 程序配置
//!
//! 默认值 → 可选 TOML 文件 → 环境变量，后者覆盖前者。

use crate::error::{AppError, AppResult, ConfigError, FileError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 图片文件夹根目录（每个子目录是一个处理单元）
    pub input_dir: PathBuf,
    /// 输出目录
    pub output_dir: PathBuf,
    /// 处理日志文件名（位于输出目录）
    pub log_file_name: String,
    /// 合并输出文件名（位于输出目录）
    pub combined_file_name: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// 图片对比度增强系数
    pub contrast_factor: f32,
    // --- 文档存储配置 ---
    /// 本地存储根目录
    pub store_dir: PathBuf,
    /// 评分标准写入的集合
    pub collection: String,
    /// download 任务的输出文件
    pub download_file: PathBuf,
    /// upload 任务的输入文件
    pub upload_file: PathBuf,
    pub firestore_project_id: Option<String>,
    pub firestore_access_token: Option<String>,
    pub firestore_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_directory"),
            output_dir: PathBuf::from("output_directory"),
            log_file_name: "processing_log.txt".to_string(),
            combined_file_name: "joint_mark_schemes.json".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.0-flash".to_string(),
            temperature: 0.2,
            top_p: 0.95,
            max_output_tokens: 8192,
            contrast_factor: 1.5,
            store_dir: PathBuf::from("local_store"),
            collection: "mark-schemes".to_string(),
            download_file: PathBuf::from("output_directory/all_firestore_data.json"),
            upload_file: PathBuf::from("data/tailored.json"),
            firestore_project_id: None,
            firestore_access_token: None,
            firestore_base_url: "https://firestore.googleapis.com/v1".to_string(),
        }
    }
}

impl Config {
    /// 只使用默认值和环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 读取可选的 TOML 配置文件，再应用环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Self::from_toml_file(path)?.with_env_overrides(),
            None => Self::from_env(),
        }
    }

    fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })
    }

    /// 解析 TOML 文本，缺省字段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> AppResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// 用给定的查找函数覆盖配置项（便于测试时不触碰进程环境）
    pub fn with_overrides<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MARKSCHEME_INPUT_DIR") {
            self.input_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MARKSCHEME_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Some(v) = lookup("LLM_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            self.llm_api_key = v;
        }
        if let Some(v) = lookup("LLM_API_BASE_URL") {
            self.llm_api_base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL_NAME") {
            self.llm_model_name = v;
        }
        if let Some(v) = lookup("LLM_TEMPERATURE") {
            self.temperature = parse_var("LLM_TEMPERATURE", &v, "f32")?;
        }
        if let Some(v) = lookup("LLM_TOP_P") {
            self.top_p = parse_var("LLM_TOP_P", &v, "f32")?;
        }
        if let Some(v) = lookup("LLM_MAX_OUTPUT_TOKENS") {
            self.max_output_tokens = parse_var("LLM_MAX_OUTPUT_TOKENS", &v, "u32")?;
        }
        if let Some(v) = lookup("MARKSCHEME_CONTRAST_FACTOR") {
            self.contrast_factor = parse_var("MARKSCHEME_CONTRAST_FACTOR", &v, "f32")?;
        }
        if let Some(v) = lookup("MARKSCHEME_STORE_DIR") {
            self.store_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MARKSCHEME_COLLECTION") {
            self.collection = v;
        }
        if let Some(v) = lookup("FIRESTORE_PROJECT_ID") {
            self.firestore_project_id = Some(v);
        }
        if let Some(v) = lookup("FIRESTORE_ACCESS_TOKEN") {
            self.firestore_access_token = Some(v);
        }
        if let Some(v) = lookup("FIRESTORE_BASE_URL") {
            self.firestore_base_url = v;
        }
        Ok(self)
    }

    /// 处理日志文件路径
    pub fn log_file_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file_name)
    }

    /// 合并输出文件路径
    pub fn combined_file_path(&self) -> PathBuf {
        self.output_dir.join(&self.combined_file_name)
    }
}

fn parse_var<T: std::str::FromStr>(var_name: &str, value: &str, expected_type: &str) -> AppResult<T> {
    value.parse().map_err(|_| {
        AppError::Config(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_toml_fills_missing_fields_with_defaults() {
        let config = Config::from_toml_str(
            r#"
            input_dir = "scans"
            llm_model_name = "gemini-1.5-pro"
            "#,
        )
        .unwrap();

        assert_eq!(config.input_dir, PathBuf::from("scans"));
        assert_eq!(config.llm_model_name, "gemini-1.5-pro");
        assert_eq!(config.collection, "mark-schemes");
        assert_eq!(config.max_output_tokens, 8192);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "secret"),
            ("LLM_TEMPERATURE", "0.5"),
            ("LLM_TOP_P", "0.8"),
            ("MARKSCHEME_CONTRAST_FACTOR", "2.0"),
            ("MARKSCHEME_COLLECTION", "papers"),
            ("FIRESTORE_PROJECT_ID", "papercheck"),
            ("FIRESTORE_BASE_URL", "http://localhost:8080/v1"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.llm_api_key, "secret");
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.top_p, 0.8);
        assert_eq!(config.contrast_factor, 2.0);
        assert_eq!(config.collection, "papers");
        assert_eq!(config.firestore_project_id.as_deref(), Some("papercheck"));
        assert_eq!(config.firestore_base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let err = Config::default()
            .with_overrides(|k| (k == "VERBOSE_LOGGING").then(|| "sometimes".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("VERBOSE_LOGGING"));

        let err = Config::default()
            .with_overrides(|k| (k == "LLM_TOP_P").then(|| "high".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("LLM_TOP_P"));
    }

    #[test]
    fn test_output_paths() {
        let config = Config::default();
        assert_eq!(
            config.combined_file_path(),
            PathBuf::from("output_directory").join("joint_mark_schemes.json")
        );
        assert_eq!(
            config.log_file_path(),
            PathBuf::from("output_directory").join("processing_log.txt")
        );
    }
}
