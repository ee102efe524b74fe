use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 得分点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarkType {
    /// M：方法分
    Method,
    /// A：结果分（依赖方法）
    Accuracy,
    /// B：独立分
    Independent,
    /// E：解释说明分
    Explanation,
    /// D：依赖分
    Dependent,
    /// FT：后续分
    FollowThrough,
    /// QWC：书面表达质量
    Communication,
    /// AO1 / AO2 ...：考核目标分
    AssessmentObjective,
    /// 无法识别
    Unknown,
}

/// 大写别名 → 类型
static ALIASES: phf::Map<&'static str, MarkType> = phf_map! {
    "M" => MarkType::Method,
    "METHOD" => MarkType::Method,
    "A" => MarkType::Accuracy,
    "ACCURACY" => MarkType::Accuracy,
    "B" => MarkType::Independent,
    "INDEPENDENT" => MarkType::Independent,
    "E" => MarkType::Explanation,
    "EXPLANATION" => MarkType::Explanation,
    "D" => MarkType::Dependent,
    "DEPENDENT" => MarkType::Dependent,
    "FT" => MarkType::FollowThrough,
    "FOLLOW THROUGH" => MarkType::FollowThrough,
    "FOLLOW-THROUGH" => MarkType::FollowThrough,
    "QWC" => MarkType::Communication,
    "AO" => MarkType::AssessmentObjective,
};

impl MarkType {
    /// 获取标准代码
    pub fn code(self) -> &'static str {
        match self {
            MarkType::Method => "M",
            MarkType::Accuracy => "A",
            MarkType::Independent => "B",
            MarkType::Explanation => "E",
            MarkType::Dependent => "D",
            MarkType::FollowThrough => "FT",
            MarkType::Communication => "QWC",
            MarkType::AssessmentObjective => "AO",
            MarkType::Unknown => "?",
        }
    }

    /// 从模型输出的 mark_type 字符串识别类型
    ///
    /// 先整体匹配（"Method"、"follow through"），再取首个词去掉编号
    /// 匹配（"M1"、"AO3"、"A1 dependent on M1"）。
    pub fn classify(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        if let Some(kind) = ALIASES.get(upper.as_str()) {
            return *kind;
        }

        let first = upper.split_whitespace().next().unwrap_or_default();
        let stem = first
            .trim_end_matches(|c: char| c.is_ascii_digit() || c.is_ascii_punctuation());
        ALIASES.get(stem).copied().unwrap_or(MarkType::Unknown)
    }
}

impl std::fmt::Display for MarkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
