use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::mark_type::MarkType;

/// 题号 → 未定型的题目数据（模型原样输出）
pub type QuestionMap = Map<String, Value>;

/// 小题（规范形式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub part_id: String,
    #[serde(default = "default_total_marks")]
    pub total_marks: i64,
    #[serde(default)]
    pub marking_points: Vec<MarkingPoint>,
}

fn default_total_marks() -> i64 {
    1
}

/// 得分点
///
/// 字段都是可选的，未知字段保存在 `extra` 中原样写回。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkingPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MarkingPoint {
    /// 得分点的分类（缺省为 Unknown）
    pub fn kind(&self) -> MarkType {
        self.mark_type
            .as_deref()
            .map(MarkType::classify)
            .unwrap_or(MarkType::Unknown)
    }
}

/// 规范化后的响应：每道题都映射到 Part 序列
///
/// 只有规范化器能构造非空实例，写入存储的也只有这一种形状。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalResponse(Map<String, Value>);

impl CanonicalResponse {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self(Map::with_capacity(capacity))
    }

    pub(crate) fn insert(&mut self, question_id: String, parts: Vec<Value>) {
        self.0.insert(question_id, Value::Array(parts));
    }

    pub fn get(&self, question_id: &str) -> Option<&Value> {
        self.0.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn question_ids(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// 评分标准统计（仅用于日志）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSchemeSummary {
    pub questions: usize,
    pub parts: usize,
    pub malformed_parts: usize,
    pub marking_points: usize,
    /// 各小题声明的总分之和（饱和相加）
    pub declared_marks: i64,
    /// 各得分点分值之和（缺省分值按 1 计）
    pub awarded_marks: i64,
    pub by_mark_type: BTreeMap<MarkType, usize>,
}

impl MarkSchemeSummary {
    pub fn from_response(response: &CanonicalResponse) -> Self {
        let mut summary = Self {
            questions: response.len(),
            ..Default::default()
        };

        for (_, parts) in response.iter() {
            let Some(parts) = parts.as_array() else {
                continue;
            };
            for raw in parts {
                summary.parts += 1;
                let part: Part = match serde_json::from_value(raw.clone()) {
                    Ok(part) => part,
                    Err(_) => {
                        summary.malformed_parts += 1;
                        continue;
                    }
                };
                summary.declared_marks = summary.declared_marks.saturating_add(part.total_marks);
                for point in &part.marking_points {
                    summary.marking_points += 1;
                    summary.awarded_marks = summary
                        .awarded_marks
                        .saturating_add(point.marks.unwrap_or(1));
                    *summary.by_mark_type.entry(point.kind()).or_default() += 1;
                }
            }
        }

        summary
    }

    /// 声明总分与得分点之和是否一致
    pub fn is_consistent(&self) -> bool {
        self.malformed_parts == 0 && self.declared_marks == self.awarded_marks
    }
}

impl std::fmt::Display for MarkSchemeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} 道题, {} 个小题, {} 个得分点, 总分 {} (得分点合计 {})",
            self.questions, self.parts, self.marking_points, self.declared_marks, self.awarded_marks
        )?;
        if self.malformed_parts > 0 {
            write!(f, ", {} 个小题格式异常", self.malformed_parts)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical(value: Value) -> CanonicalResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_marking_point_keeps_unknown_fields() {
        let point: MarkingPoint = serde_json::from_value(json!({
            "point_id": 1,
            "marks": 2,
            "criteria": "correct substitution",
            "notes": "allow ft"
        }))
        .unwrap();

        assert_eq!(point.marks, Some(2));
        assert_eq!(point.extra.get("notes"), Some(&json!("allow ft")));
        assert_eq!(
            serde_json::to_value(&point).unwrap(),
            json!({"point_id": 1, "marks": 2, "criteria": "correct substitution", "notes": "allow ft"})
        );
    }

    #[test]
    fn test_summary_counts() {
        let response = canonical(json!({
            "1a": [{
                "part_id": "",
                "total_marks": 3,
                "marking_points": [
                    {"point_id": 1, "marks": 1, "mark_type": "M1"},
                    {"point_id": 2, "marks": 2, "mark_type": "A1"}
                ]
            }],
            "2": [
                {"part_id": "i", "total_marks": 1, "marking_points": [{"mark_type": "B1"}]},
                {"part_id": "ii", "total_marks": "one", "marking_points": []}
            ],
            "3": []
        }));

        let summary = MarkSchemeSummary::from_response(&response);
        assert_eq!(summary.questions, 3);
        assert_eq!(summary.parts, 3);
        assert_eq!(summary.malformed_parts, 1);
        assert_eq!(summary.marking_points, 3);
        assert_eq!(summary.declared_marks, 4);
        assert_eq!(summary.awarded_marks, 4);
        assert_eq!(summary.by_mark_type.get(&MarkType::Method), Some(&1));
        assert_eq!(summary.by_mark_type.get(&MarkType::Independent), Some(&1));
        assert!(!summary.is_consistent());
    }

    #[test]
    fn test_summary_saturates_on_huge_marks() {
        let response = canonical(json!({
            "1": [
                {"part_id": "a", "total_marks": i64::MAX, "marking_points": [{"marks": i64::MAX}]},
                {"part_id": "b", "total_marks": i64::MAX, "marking_points": [{"marks": 1}]}
            ]
        }));

        let summary = MarkSchemeSummary::from_response(&response);
        assert_eq!(summary.parts, 2);
        assert_eq!(summary.declared_marks, i64::MAX);
        assert_eq!(summary.awarded_marks, i64::MAX);
    }

    #[test]
    fn test_canonical_response_is_transparent() {
        let response = canonical(json!({"6ii": []}));
        assert_eq!(response.question_ids().collect::<Vec<_>>(), vec!["6ii"]);
        assert_eq!(response.into_value(), json!({"6ii": []}));
    }
}
