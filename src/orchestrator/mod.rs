//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和任务调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量单元处理器
//! - 准备输出目录和处理日志
//! - 批量加载单元（Vec<ExtractionUnit>）
//! - 顺序处理，汇总合并输出
//! - 输出全局统计信息
//!
//! ### `unit_processor` - 单个单元处理器
//! - 调用 ExtractionFlow
//! - 写单元文件
//! - 成功/失败写入处理日志
//!
//! ### `store_tasks` - 存储任务
//! - import / upload / download / clear
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ExtractionUnit>)
//!     ↓
//! unit_processor (处理单个 ExtractionUnit)
//!     ↓
//! workflow::ExtractionFlow (图片 → 规范化结果)
//!     ↓
//! services (能力层：image / llm / sanitize / normalize / output)
//!
//! store_tasks → store (基础设施：DocumentStore)
//! ```

pub mod batch_processor;
pub mod store_tasks;
pub mod unit_processor;

// 重新导出主要类型
pub use batch_processor::{App, ProcessingStats};
pub use store_tasks::{clear_all, download_all, import_combined, upload_documents, TaskReport};
pub use unit_processor::{process_unit, UnitOutcome};
