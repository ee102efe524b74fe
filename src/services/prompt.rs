//! 评分标准提取提示词

/// 发送给视觉模型的默认提示词
pub const MARK_SCHEME_PROMPT: &str = r#"Analyze the attached exam mark scheme images with high precision. Extract every marking criterion, point allocation and expected answer.

Return ONE JSON object with this shape:
{
  "<question number>": [            // e.g. "1a", "2", "3b", "6i", "6ii", "9aii", "8ci"
    {
      "part_id": "string",           // sub-part label, "" when the question has no sub-parts
      "total_marks": number,         // marks available for this part
      "marking_points": [
        {
          "point_id": number,        // sequential, starting from 1
          "marks": number,           // marks this point is worth (usually 1)
          "criteria": "string",      // what earns the mark, including any conditions
          "expected_answer": "string", // the answer or working expected
          "mark_type": "string"      // see mark types below
        }
      ]
    }
  ]
}

Mark types (keep numbering such as M1, A2, B1 when the scheme shows it):
- "M" Method: correct method, even if the final answer is wrong
- "A" Accuracy: correct answer or step that depends on a method mark
- "B" Independent: standalone correct answer
- "E" Explanation: reasoning or justification
- "D" Dependent: only if a previous mark is awarded
- "FT" Follow Through: credit for correct work based on an earlier error
- "QWC": quality of written communication
- "AO1", "AO2", "AO3": assessment objective marks

Formatting rules:
- Use the question number exactly as printed as the top-level key.
- Preserve mathematical notation exactly.
- Separate alternative acceptable answers with " OR ".
- Write ranges as "between X and Y" or "X to Y".
- State dependencies between marks in the criteria (e.g. "A1 dependent on M1").
- Every mark on the page must be accounted for.

Only return valid JSON, without explanation or commentary."#;
