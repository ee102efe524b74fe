//! 输出文件服务 - 业务能力层
//!
//! 写单元 JSON 文件和合并 JSON 文件（4 空格缩进，键顺序保持插入顺序）

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::models::CanonicalResponse;

const INDENT: &[u8] = b"    ";

/// 以 4 空格缩进序列化
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

/// 写 JSON 文件，必要时创建父目录
pub async fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }
    let content = to_pretty_json(value)?;
    fs::write(path, content)
        .await
        .with_context(|| format!("无法写入文件: {}", path.display()))?;
    Ok(())
}

/// 读取 JSON 文件
pub async fn read_json_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("JSON 格式错误: {}", path.display()))
}

/// 单元输出路径：`<output_dir>/<unit_name>.json`
pub fn unit_output_path(output_dir: &Path, unit_name: &str) -> PathBuf {
    output_dir.join(format!("{}.json", unit_name))
}

/// 合并输出：单元名 → 规范化结果，只包含成功的单元
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CombinedOutput {
    units: Map<String, Value>,
}

impl CombinedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit_name: &str, response: CanonicalResponse) {
        self.units.insert(unit_name.to_string(), response.into_value());
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn contains(&self, unit_name: &str) -> bool {
        self.units.contains_key(unit_name)
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        write_json_file(path, &self.units).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_four_space_indentation_keeps_key_order() {
        let value = json!({"b": [1], "a": {}});
        assert_eq!(
            to_pretty_json(&value).unwrap(),
            "{\n    \"b\": [\n        1\n    ],\n    \"a\": {}\n}"
        );
    }

    #[tokio::test]
    async fn test_combined_output_round_trip() {
        let dir = std::env::temp_dir().join(format!("msp-output-{}", std::process::id()));
        let path = dir.join("nested").join("joint_mark_schemes.json");

        let mut combined = CombinedOutput::new();
        let response: CanonicalResponse = serde_json::from_value(json!({"1": []})).unwrap();
        combined.insert("2020_P1_MS", response);
        combined.write(&path).await.unwrap();

        let read = read_json_file(&path).await.unwrap();
        assert_eq!(read, json!({"2020_P1_MS": {"1": []}}));
        assert!(combined.contains("2020_P1_MS"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unit_output_path() {
        assert_eq!(
            unit_output_path(Path::new("out"), "2021_P3_MS"),
            Path::new("out").join("2021_P3_MS.json")
        );
    }
}
