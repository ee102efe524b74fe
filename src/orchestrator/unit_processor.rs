//! 单个单元处理器 - 编排层
//!
//! ## 职责
//!
//! 负责一个文件夹的处理和落盘，是单元级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **记录开始**：写入文件夹名和图片列表
//! 2. **流程调度**：委托 `ExtractionFlow` 得到规范化结果
//! 3. **结果落盘**：写 `<单元名>.json`
//! 4. **失败记录**：任何错误写入处理日志，不向上传播

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::models::{CanonicalResponse, ExtractionUnit};
use crate::services::output_writer::{unit_output_path, write_json_file};
use crate::services::{ModelClient, ProcessingLog};
use crate::workflow::{ExtractionFlow, UnitCtx};

/// 单元处理结果
#[derive(Debug)]
pub enum UnitOutcome {
    /// 已写入单元文件
    Saved {
        path: PathBuf,
        response: CanonicalResponse,
    },
    /// 文件夹中没有图片
    Skipped,
    /// 处理失败（已写入处理日志）
    Failed { reason: String },
}

/// 处理单个单元
///
/// 单元文件与合并文件同名时该单元失败，避免合并文件覆盖它。
/// 只有处理日志本身写不进去时才返回 `Err`。
pub async fn process_unit<M: ModelClient>(
    flow: &ExtractionFlow<M>,
    unit: &ExtractionUnit,
    ctx: &UnitCtx,
    output_dir: &Path,
    combined_file: &Path,
    log: &ProcessingLog,
) -> Result<UnitOutcome> {
    if unit.images.is_empty() {
        info!("{} ⏭️ 没有图片，跳过", ctx);
        return Ok(UnitOutcome::Skipped);
    }

    log.unit_started(&unit.name, &unit.image_names())?;

    let path = unit_output_path(output_dir, &unit.name);
    let outcome = if path == combined_file {
        Err(anyhow!(
            "单元文件 {} 与合并输出文件同名，请重命名文件夹",
            path.display()
        ))
    } else {
        match flow.run(unit, ctx).await {
            Ok(response) => save_unit(path, response).await,
            Err(e) => Err(e),
        }
    };

    match outcome {
        Ok((path, response)) => {
            log.unit_saved(&path)?;
            info!("{} ✅ 已保存至 {}", ctx, path.display());
            Ok(UnitOutcome::Saved { path, response })
        }
        Err(e) => {
            let reason = format!("{:#}", e);
            error!("{} ❌ 处理失败: {}", ctx, reason);
            log.unit_failed(&reason)?;
            Ok(UnitOutcome::Failed { reason })
        }
    }
}

async fn save_unit(path: PathBuf, response: CanonicalResponse) -> Result<(PathBuf, CanonicalResponse)> {
    write_json_file(&path, &response).await?;
    Ok((path, response))
}
