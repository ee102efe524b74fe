//! 批量单元处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是提取任务的入口，负责批量单元的处理和结果汇总。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建输出目录、重建处理日志
//! 2. **批量加载**：扫描输入目录下的所有文件夹（`Vec<ExtractionUnit>`）
//! 3. **顺序处理**：一个单元处理完再开始下一个
//! 4. **合并输出**：只收录成功的单元，最后写一次合并文件
//! 5. **全局统计**：汇总所有单元的处理结果

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::load_all_units;
use crate::orchestrator::unit_processor::{process_unit, UnitOutcome};
use crate::services::{CombinedOutput, ModelClient, ProcessingLog};
use crate::utils::logging::{log_startup, log_unit_start, log_units_loaded, print_final_stats};
use crate::workflow::{ExtractionFlow, UnitCtx};

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 应用主结构
pub struct App<M> {
    config: Config,
    flow: ExtractionFlow<M>,
    log: ProcessingLog,
}

impl<M: ModelClient> App<M> {
    /// 初始化应用
    pub async fn initialize(config: Config, model: M) -> Result<Self> {
        log_startup("评分标准提取", &config.input_dir.display().to_string());

        fs::create_dir_all(&config.output_dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", config.output_dir.display()))?;

        let log = ProcessingLog::create(config.log_file_path())?;
        let flow = ExtractionFlow::new(model, &config);

        Ok(Self { config, flow, log })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        info!("\n📁 正在扫描待处理的文件夹...");
        let units = load_all_units(&self.config.input_dir).await?;

        let mut stats = ProcessingStats {
            total: units.len(),
            ..Default::default()
        };
        let empty = units.iter().filter(|u| u.images.is_empty()).count();
        log_units_loaded(units.len(), empty);

        if units.is_empty() {
            warn!("⚠️ 没有找到待处理的文件夹");
        }

        let mut combined = CombinedOutput::new();
        let combined_path = self.config.combined_file_path();

        for (index, unit) in units.iter().enumerate() {
            let ctx = UnitCtx::new(&unit.name, index + 1, units.len());
            if !unit.images.is_empty() {
                log_unit_start(ctx.unit_index, ctx.total_units, &unit.name, unit.images.len());
            }

            let outcome = process_unit(
                &self.flow,
                unit,
                &ctx,
                &self.config.output_dir,
                &combined_path,
                &self.log,
            )
            .await?;
            match outcome {
                UnitOutcome::Saved { response, .. } => {
                    combined.insert(&unit.name, response);
                    stats.success += 1;
                }
                UnitOutcome::Skipped => stats.skipped += 1,
                UnitOutcome::Failed { .. } => stats.failed += 1,
            }
        }

        combined.write(&combined_path).await?;
        info!(
            "✅ 合并结果已保存至 {} ({} 个单元)",
            combined_path.display(),
            combined.len()
        );

        print_final_stats(
            stats.success,
            stats.failed,
            stats.skipped,
            &self.log.path().display().to_string(),
        );

        Ok(stats)
    }
}
