//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化 tracing（`RUST_LOG` 优先，否则按 verbose 选择级别）
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "markscheme_pipeline=debug,markscheme=debug,info"
    } else {
        "info"
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `task`: 任务名
/// - `detail`: 任务相关的路径或目标
pub fn log_startup(task: &str, detail: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", task);
    info!("📂 {}", detail);
    info!("{}", "=".repeat(60));
}

/// 记录单元加载信息
pub fn log_units_loaded(total: usize, skipped: usize) {
    info!("✓ 找到 {} 个待处理的文件夹", total);
    if skipped > 0 {
        info!("💡 其中 {} 个文件夹没有图片，将跳过", skipped);
    }
}

/// 记录单元开始处理
///
/// # 参数
/// - `index`: 单元编号（从1开始）
/// - `total`: 单元总数
/// - `name`: 单元名
/// - `images`: 图片数量
pub fn log_unit_start(index: usize, total: usize, name: &str, images: usize) {
    info!("\n{}", "─".repeat(60));
    info!("📦 [{}/{}] 开始处理: {} ({} 张图片)", index, total, name, images);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `skipped`: 跳过数量
/// - `log_file_path`: 处理日志路径
pub fn print_final_stats(success: usize, failed: usize, skipped: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, success + failed);
    info!("❌ 失败: {}", failed);
    info!("⏭️ 跳过: {}", skipped);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
