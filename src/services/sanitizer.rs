//! 响应文本清洗 - 业务能力层
//!
//! 把模型返回的"应该是 JSON"的文本变成可解析的 JSON。
//!
//! 流程：去空白 → 提取 ```json 代码块（或删除其他代码块）→ 消除缩进换行
//! → 解析；失败则修复一次（删除尾随逗号、合并空白）后再解析，仍失败即终止。

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::SanitizeError;
use crate::utils::logging::truncate_text;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("static regex"));
static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("static regex"));

/// 模型美化输出时插入的缩进换行，按从长到短的顺序替换为单个空格
const INDENT_ARTIFACTS: [&str; 3] = ["\n            ", "\n        ", "\n    "];

/// 解析尝试的状态
///
/// `Initial` 失败后进入 `Repaired`，`Repaired` 失败后进入 `Failed`，
/// 因此最多只会修复一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeState {
    /// 直接解析清洗后的文本
    Initial,
    /// 解析修复后的文本
    Repaired,
    /// 修复后仍失败（终止）
    Failed,
}

impl SanitizeState {
    /// 一次解析失败后的下一个状态
    pub fn after_failure(self) -> Self {
        match self {
            SanitizeState::Initial => SanitizeState::Repaired,
            SanitizeState::Repaired | SanitizeState::Failed => SanitizeState::Failed,
        }
    }
}

/// 清洗结果
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    pub value: Value,
    /// 成功解析时所处的状态（`Initial` 或 `Repaired`）
    pub state: SanitizeState,
    /// 最终被解析的文本
    pub text: String,
}

/// 步骤 1-4：去掉代码块包装和缩进换行，不做解析
pub fn clean_response_text(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    if text.contains("```json") {
        if let Some(inner) = JSON_FENCE.captures(&text).and_then(|c| c.get(1)) {
            text = inner.as_str().trim().to_string();
        }
    } else {
        text = ANY_FENCE.replace_all(&text, "").trim().to_string();
    }

    for artifact in INDENT_ARTIFACTS {
        text = text.replace(artifact, " ");
    }

    text
}

/// 修复常见的 JSON 格式问题
///
/// 只改写字符串字面量之外的内容：删除 `}` / `]` 前的尾随逗号，
/// 并把连续空白（含换行）合并为一个空格。字符串内部的原始换行、
/// 制表符改写为转义序列，其余字符保持不变。
pub fn repair_json_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_space = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' => {
                    in_string = false;
                    out.push(ch);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(ch),
            }
            continue;
        }

        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        if ch == ',' && closes_next(&text[idx + 1..]) {
            continue;
        }

        if pending_space {
            if !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
        }
        if ch == '"' {
            in_string = true;
        }
        out.push(ch);
    }

    out
}

/// 下一个非空白字符是否为 `}` 或 `]`
fn closes_next(rest: &str) -> bool {
    rest.trim_start()
        .starts_with(|c: char| c == '}' || c == ']')
}

/// 清洗并解析模型响应
///
/// 修复后仍无法解析时返回 `SanitizeError::Unparseable`，调用方应记录并跳过该单元。
pub fn sanitize(raw: &str) -> Result<Sanitized, SanitizeError> {
    let mut text = clean_response_text(raw);
    if text.is_empty() {
        return Err(SanitizeError::EmptyResponse);
    }

    let mut state = SanitizeState::Initial;
    loop {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                debug!("JSON 解析成功 ({:?})", state);
                return Ok(Sanitized { value, state, text });
            }
            Err(err) => {
                state = state.after_failure();
                match state {
                    SanitizeState::Repaired => {
                        warn!("⚠️ JSON 解析失败: {}，尝试修复", err);
                        text = repair_json_text(&text);
                    }
                    SanitizeState::Initial | SanitizeState::Failed => {
                        debug!("修复后仍无法解析: {}", truncate_text(&text, 200));
                        return Err(SanitizeError::Unparseable { source: err, text });
                    }
                }
            }
        }
    }
}
