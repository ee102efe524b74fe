//! 单元处理上下文
//!
//! 封装"我正在处理第几个文件夹"这一信息

use std::fmt::Display;

/// 单元处理上下文
#[derive(Debug, Clone)]
pub struct UnitCtx {
    /// 单元名（文件夹名）
    pub unit_name: String,

    /// 单元索引（从1开始，仅用于日志显示）
    pub unit_index: usize,

    /// 本次运行的单元总数
    pub total_units: usize,
}

impl UnitCtx {
    /// 创建新的单元上下文
    pub fn new(unit_name: impl Into<String>, unit_index: usize, total_units: usize) -> Self {
        Self {
            unit_name: unit_name.into(),
            unit_index,
            total_units,
        }
    }
}

impl Display for UnitCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[单元 {}/{} {}]",
            self.unit_index, self.total_units, self.unit_name
        )
    }
}
