//! 结构规范化 - 业务能力层
//!
//! 模型输出的每道题形状不一，这里统一改写成"Part 序列"。
//! 只保证形状，不校验得分点字段的类型。

use serde_json::{json, Map, Value};

use crate::error::NormalizeError;
use crate::models::{CanonicalResponse, QuestionMap};

/// 合成 Part 时不属于得分点的字段
const PART_FIELDS: [&str; 3] = ["part_id", "total_marks", "marking_points"];

/// 合成 Part 缺少 total_marks 时的默认分值
const DEFAULT_TOTAL_MARKS: i64 = 1;

/// 单道题数据的形状，按顺序判定，先匹配者胜出
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuestionShape<'a> {
    /// 已经是序列，视为规范形式
    Sequence(&'a [Value]),
    /// 旧格式：对象里的 `parts` 字段
    PartsWrapped(&'a Value),
    /// 没有 `parts` 的对象，需要合成单个 Part
    FlatObject(&'a Map<String, Value>),
    /// 标量或 null
    Other,
}

impl<'a> QuestionShape<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => QuestionShape::Sequence(items),
            Value::Object(obj) => match obj.get("parts") {
                Some(parts) => QuestionShape::PartsWrapped(parts),
                None => QuestionShape::FlatObject(obj),
            },
            _ => QuestionShape::Other,
        }
    }
}

/// 把一道题的数据改写为 Part 序列
///
/// 非序列的 `parts` 会再按同样的规则判定一次，所以结果总是序列。
pub fn normalize_question(value: &Value) -> Vec<Value> {
    match QuestionShape::classify(value) {
        QuestionShape::Sequence(items) => items.to_vec(),
        QuestionShape::PartsWrapped(parts) => normalize_question(parts),
        QuestionShape::FlatObject(obj) => vec![synthesize_part(obj)],
        QuestionShape::Other => Vec::new(),
    }
}

/// 由扁平对象合成一个 `part_id` 为空的 Part
///
/// 没有 `marking_points` 时，把其余字段收集成一个得分点；
/// 其余字段也没有时得分点列表为空。
fn synthesize_part(obj: &Map<String, Value>) -> Value {
    let total_marks = obj
        .get("total_marks")
        .cloned()
        .unwrap_or_else(|| json!(DEFAULT_TOTAL_MARKS));

    let marking_points = match obj.get("marking_points") {
        Some(points) => points.clone(),
        None => {
            let point: Map<String, Value> = obj
                .iter()
                .filter(|(key, _)| !PART_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            if point.is_empty() {
                json!([])
            } else {
                json!([point])
            }
        }
    };

    json!({
        "part_id": "",
        "total_marks": total_marks,
        "marking_points": marking_points,
    })
}

/// 规范化整个题号映射，键一个不少，顺序不变
pub fn normalize_map(questions: &QuestionMap) -> CanonicalResponse {
    let mut canonical = CanonicalResponse::with_capacity(questions.len());
    for (question_id, data) in questions {
        canonical.insert(question_id.clone(), normalize_question(data));
    }
    canonical
}

/// 规范化解析后的模型响应
///
/// `null` 或空对象返回 `Ok(None)`（没有可规范化的内容）；
/// 顶层不是对象则是整个单元的结构错误。
pub fn normalize_response(parsed: &Value) -> Result<Option<CanonicalResponse>, NormalizeError> {
    match parsed {
        Value::Null => Ok(None),
        Value::Object(questions) if questions.is_empty() => Ok(None),
        Value::Object(questions) => Ok(Some(normalize_map(questions))),
        other => Err(NormalizeError::NotAnObject {
            found: json_type_name(other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
