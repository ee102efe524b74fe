//! # Mark Scheme Pipeline
//!
//! 把试卷评分标准图片交给视觉模型提取，清洗、规范化后写成 JSON，
//! 并在 JSON 文件和文档存储之间搬运。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Store）
//! - `store/` - 文档存储，只暴露键值文档能力
//! - `LocalDocumentStore` - 本地目录
//! - `FirestoreStore` - Firestore REST
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个单元
//! - `ImageService` - 灰度化 + 对比度增强
//! - `LlmService` - 视觉模型调用
//! - `sanitizer` - 模型文本 → JSON（必要时修复一次）
//! - `normalizer` - 各种题目形状 → Part 序列
//! - `ProcessingLog` / `output_writer` - 写日志和输出文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件夹"的完整处理流程
//! - `UnitCtx` - 上下文封装（单元名 + 序号）
//! - `ExtractionFlow` - 流程编排（图片 → 模型 → 清洗 → 规范化）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量单元处理器
//! - `orchestrator/unit_processor` - 单个单元处理器
//! - `orchestrator/store_tasks` - 导入、上传、下载、清空
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{CanonicalResponse, ExtractionUnit, MarkType};
pub use orchestrator::{App, ProcessingStats, TaskReport};
pub use services::{normalize_response, sanitize, LlmService, ModelClient};
pub use store::{DocumentStore, LocalDocumentStore, StoreBackend};
pub use workflow::{ExtractionFlow, UnitCtx};
