//! 处理日志服务 - 业务能力层
//!
//! 只负责"写 processing_log.txt"能力，记录每个单元的成功/失败

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 处理日志（纯文本，只追加）
pub struct ProcessingLog {
    path: PathBuf,
}

impl ProcessingLog {
    /// 创建（覆盖）日志文件并写入表头
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let header = format!(
            "{}\n评分标准处理日志 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        fs::write(&path, header)
            .with_context(|| format!("无法创建日志文件: {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 记录开始处理某个单元
    pub fn unit_started(&self, unit_name: &str, image_names: &[String]) -> Result<()> {
        self.append(&format!(
            "处理文件夹: {}\n找到 {} 张图片: {}\n",
            unit_name,
            image_names.len(),
            image_names.join(", ")
        ))
    }

    /// 记录单元处理成功
    pub fn unit_saved(&self, output_file: &Path) -> Result<()> {
        self.append(&format!("✅ 处理成功，已保存至 {}\n\n", output_file.display()))
    }

    /// 记录单元处理失败
    pub fn unit_failed(&self, reason: &str) -> Result<()> {
        self.append(&format!("❌ 错误: {}\n\n", reason))
    }

    fn append(&self, line: &str) -> Result<()> {
        debug!("写入处理日志: {}", line.trim_end());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("无法打开日志文件: {}", self.path.display()))?;

        file.write_all(line.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_recreated_and_appended() {
        let dir = std::env::temp_dir().join(format!("msp-log-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("processing_log.txt");
        std::fs::write(&path, "stale content\n").unwrap();

        let log = ProcessingLog::create(&path).unwrap();
        log.unit_started("2019_P1_MS", &["a.png".to_string(), "b.png".to_string()])
            .unwrap();
        log.unit_failed("JSON解析失败").unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(!content.contains("stale content"));
        assert!(content.contains("评分标准处理日志"));
        assert!(content.contains("处理文件夹: 2019_P1_MS\n找到 2 张图片: a.png, b.png\n"));
        assert!(content.ends_with("❌ 错误: JSON解析失败\n\n"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
