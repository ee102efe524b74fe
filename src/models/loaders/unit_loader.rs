use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::FileError;

/// 可识别的图片扩展名（忽略大小写）
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 一个处理单元：一个图片文件夹 → 一份模型响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionUnit {
    /// 单元名（文件夹名），也是合并输出中的键
    pub name: String,
    pub folder: PathBuf,
    /// 按路径排序的图片文件
    pub images: Vec<PathBuf>,
}

impl ExtractionUnit {
    /// 图片文件名列表（用于日志）
    pub fn image_names(&self) -> Vec<String> {
        self.images
            .iter()
            .map(|p| p.file_name().unwrap_or_default().to_string_lossy().to_string())
            .collect()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// 从单个文件夹加载处理单元
pub async fn load_unit(folder: &Path) -> Result<ExtractionUnit> {
    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("无法获取文件夹名: {}", folder.display()))?;

    let mut images = Vec::new();
    let mut entries = fs::read_dir(folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_image(&path) {
            images.push(path);
        }
    }
    images.sort();

    Ok(ExtractionUnit {
        name,
        folder: folder.to_path_buf(),
        images,
    })
}

/// 扫描根目录下的所有子文件夹，按名称排序返回处理单元
///
/// 没有图片的文件夹也会返回（`images` 为空），由调用方决定是否跳过。
pub async fn load_all_units(root: &Path) -> Result<Vec<ExtractionUnit>> {
    if !root.exists() {
        return Err(FileError::DirectoryNotFound {
            path: root.display().to_string(),
        }
        .into());
    }

    let mut folders = Vec::new();
    let mut entries = fs::read_dir(root)
        .await
        .with_context(|| format!("无法读取文件夹: {}", root.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            folders.push(entry.path());
        }
    }
    folders.sort();

    let mut units = Vec::with_capacity(folders.len());
    for folder in folders {
        let unit = load_unit(&folder).await?;
        tracing::debug!("发现单元 {}: {} 张图片", unit.name, unit.images.len());
        units.push(unit);
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("msp-loader-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_units_sorted_and_images_filtered() {
        let root = scratch_dir("sorted");
        std::fs::create_dir_all(root.join("2019_P2_MS")).unwrap();
        std::fs::create_dir_all(root.join("2019_P1_MS")).unwrap();
        std::fs::write(root.join("2019_P1_MS/page2.PNG"), b"x").unwrap();
        std::fs::write(root.join("2019_P1_MS/page1.jpg"), b"x").unwrap();
        std::fs::write(root.join("2019_P1_MS/notes.txt"), b"x").unwrap();
        std::fs::write(root.join("stray.png"), b"x").unwrap();

        let units = load_all_units(&root).await.unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].name, "2019_P1_MS");
        assert_eq!(units[0].image_names(), vec!["page1.jpg", "page2.PNG"]);
        assert_eq!(units[1].name, "2019_P2_MS");
        assert!(units[1].images.is_empty());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let root = std::env::temp_dir().join("msp-loader-does-not-exist");
        assert!(load_all_units(&root).await.is_err());
    }
}
