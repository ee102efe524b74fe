//! 单元提取流程 - 流程层
//!
//! 核心职责：定义"一个文件夹"的完整处理流程
//!
//! 流程顺序：
//! 1. 图片预处理 → data URL
//! 2. 调用模型，拿回原始文本
//! 3. 清洗（必要时修复一次）→ 解析
//! 4. 结构规范化

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{CanonicalResponse, ExtractionUnit, MarkSchemeSummary};
use crate::services::prompt::MARK_SCHEME_PROMPT;
use crate::services::{normalize_response, sanitize, ImageService, ModelClient, SanitizeState};
use crate::utils::truncate_text;
use crate::workflow::unit_ctx::UnitCtx;

/// 单元提取流程
///
/// - 编排一个单元从图片到规范化结果的流程
/// - 不写任何文件（由编排层负责）
/// - 只依赖业务能力（services）
pub struct ExtractionFlow<M> {
    model: M,
    image_service: ImageService,
    prompt: String,
    verbose_logging: bool,
}

impl<M: ModelClient> ExtractionFlow<M> {
    /// 创建新的提取流程
    pub fn new(model: M, config: &Config) -> Self {
        Self {
            model,
            image_service: ImageService::new(config.contrast_factor),
            prompt: MARK_SCHEME_PROMPT.to_string(),
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(&self, unit: &ExtractionUnit, ctx: &UnitCtx) -> Result<CanonicalResponse> {
        // ========== 1. 图片预处理 ==========
        let mut images = Vec::with_capacity(unit.images.len());
        for path in &unit.images {
            let url = self
                .image_service
                .load_data_url(path)
                .with_context(|| format!("图片处理失败: {}", path.display()))?;
            images.push(url);
        }
        debug!("{} 🖼️ 已预处理 {} 张图片", ctx, images.len());

        // ========== 2. 调用模型 ==========
        info!("{} 🤖 正在调用模型...", ctx);
        let raw = self
            .model
            .generate(&self.prompt, &images)
            .await
            .context("模型调用失败")?;

        if self.verbose_logging {
            debug!("{} 模型原始响应: {}", ctx, truncate_text(&raw, 300));
        }

        // ========== 3. 清洗 + 解析 ==========
        let sanitized = sanitize(&raw)?;
        if sanitized.state == SanitizeState::Repaired {
            warn!("{} ⚠️ 模型响应经修复后才解析成功", ctx);
        }

        // ========== 4. 规范化 ==========
        let Some(response) = normalize_response(&sanitized.value)? else {
            bail!("模型响应为空对象");
        };

        let summary = MarkSchemeSummary::from_response(&response);
        info!("{} ✓ 解析完成: {}", ctx, summary);
        if !summary.is_consistent() {
            warn!("{} ⚠️ 得分点分值之和与小题总分不一致", ctx);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::{Path, PathBuf};

    struct CannedModel(&'static str);

    impl ModelClient for CannedModel {
        async fn generate(&self, _prompt: &str, images: &[String]) -> Result<String> {
            assert!(images.iter().all(|url| url.starts_with("data:image/png;base64,")));
            Ok(self.0.to_string())
        }
    }

    fn scratch_unit(name: &str) -> ExtractionUnit {
        let folder = std::env::temp_dir().join(format!("msp-flow-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&folder).unwrap();
        let image = folder.join("page1.png");
        image::RgbImage::from_pixel(4, 4, image::Rgb([200, 120, 40]))
            .save(&image)
            .unwrap();
        ExtractionUnit {
            name: name.to_string(),
            folder,
            images: vec![image],
        }
    }

    fn cleanup(folder: &Path) {
        let _ = std::fs::remove_dir_all(folder);
    }

    #[tokio::test]
    async fn test_fenced_response_is_normalized() {
        let unit = scratch_unit("fenced");
        let flow = ExtractionFlow::new(
            CannedModel("```json\n{\"1\": {\"total_marks\": 2, \"criteria\": \"x = 4\"},}\n```"),
            &Config::default(),
        );

        let response = flow.run(&unit, &UnitCtx::new("fenced", 1, 1)).await.unwrap();
        assert_eq!(
            response.get("1"),
            Some(&json!([{
                "part_id": "",
                "total_marks": 2,
                "marking_points": [{"criteria": "x = 4"}]
            }]))
        );

        cleanup(&unit.folder);
    }

    #[tokio::test]
    async fn test_garbage_response_fails() {
        let unit = scratch_unit("garbage");
        let flow = ExtractionFlow::new(CannedModel("I could not read the image."), &Config::default());

        assert!(flow.run(&unit, &UnitCtx::new("garbage", 1, 1)).await.is_err());

        cleanup(&unit.folder);
    }

    #[tokio::test]
    async fn test_empty_object_fails() {
        let unit = scratch_unit("empty");
        let flow = ExtractionFlow::new(CannedModel("{}"), &Config::default());

        let err = flow.run(&unit, &UnitCtx::new("empty", 1, 1)).await.unwrap_err();
        assert!(err.to_string().contains("空"));

        cleanup(&unit.folder);
    }

    #[tokio::test]
    async fn test_unreadable_image_fails() {
        let folder = std::env::temp_dir().join(format!("msp-flow-{}-broken", std::process::id()));
        std::fs::create_dir_all(&folder).unwrap();
        let image = folder.join("broken.png");
        std::fs::write(&image, b"not a png").unwrap();
        let unit = ExtractionUnit {
            name: "broken".to_string(),
            folder: folder.clone(),
            images: vec![PathBuf::from(&image)],
        };
        let flow = ExtractionFlow::new(CannedModel("{\"1\": []}"), &Config::default());

        assert!(flow.run(&unit, &UnitCtx::new("broken", 1, 1)).await.is_err());

        cleanup(&folder);
    }
}
