//! 评分提示词与模型输出解析

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{ScoreOutcome, ScoreRequest, ScorerError};

const NO_ANSWER: &str = "(No answer provided)";
const MARKS_PREFIX: &str = "Marks:";
const FEEDBACK_PREFIX: &str = "Feedback:";

// `Marks:` 行开头的数值，允许 "7/10"、"7 out of 10" 之类的写法
static MARKS_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\**\s*(\d+(?:\.\d+)?)").expect("Invalid marks pattern"));

pub const SYSTEM_PROMPT: &str = "You are an assistant that evaluates exam answers fairly and consistently. Follow the output format exactly.";

/// 构造评分提示词
pub fn build_prompt(request: &ScoreRequest) -> String {
    let max_marks = request.max_marks;
    let word_limit = request.word_limit.filter(|l| *l > 0);
    let answer = if request.answer_text.trim().is_empty() {
        NO_ANSWER
    } else {
        request.answer_text.as_str()
    };

    let mut parts = vec![
        "You are evaluating an exam answer.".to_string(),
        format!("Maximum Marks for this question: {max_marks}"),
        format!("Question Type: {}", request.question_type),
        format!("Question: {}", request.question_text),
    ];
    if let Some(limit) = word_limit {
        parts.push(format!("Suggested Word Limit: Approximately {limit} words."));
    }
    parts.push(format!("Student's Answer:\n```\n{answer}\n```"));

    let mut criteria = vec![
        "Evaluation Criteria:".to_string(),
        "- Relevance & Accuracy: How well does the answer address the question? Is it factually correct?".to_string(),
        "- Completeness: Does the answer cover the key aspects required by the question?".to_string(),
        "- Coherence & Clarity: Is the answer well-organized and easy to understand?".to_string(),
    ];
    if let Some(limit) = word_limit {
        criteria.push(format!(
            "- Word Count: Consider whether the answer is reasonably close to the ~{limit} word limit."
        ));
    }
    parts.push(criteria.join("\n"));

    parts.push(format!(
        "Output Format Instructions:\nProvide your evaluation ONLY as the following JSON object, with no text before or after it:\n```json\n{{\n  \"marks_awarded\": <number between 0 and {max_marks}>,\n  \"feedback\": \"<2-4 sentences explaining the score, naming strengths and areas for improvement>\"\n}}\n```"
    ));
    parts.push(format!(
        "IMPORTANT: 'marks_awarded' must be a number from 0 to {max_marks} (inclusive) and 'feedback' must be a non-empty string."
    ));

    parts.join("\n\n")
}

// 去掉 ```json ... ``` 代码块包裹
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn check_marks(marks: f64, max_marks: f64) -> Result<f64, ScorerError> {
    if marks.is_finite() && (0.0..=max_marks).contains(&marks) {
        Ok(marks)
    } else {
        Err(ScorerError::InvalidOutput(format!(
            "marks {marks} outside the valid range [0, {max_marks}]"
        )))
    }
}

/// 解析模型输出
///
/// 优先按 JSON `{marks_awarded, feedback}` 解析；不是合法 JSON 时退回
/// `Marks:` / `Feedback:` 文本格式。
pub fn parse_evaluation_output(text: &str, max_marks: f64) -> Result<ScoreOutcome, ScorerError> {
    if text.trim().is_empty() {
        return Err(ScorerError::InvalidOutput("empty response".to_string()));
    }

    let cleaned = strip_code_fence(text);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => parse_json_output(&value, max_marks),
        Err(_) => parse_structured_text(cleaned, max_marks),
    }
}

fn parse_json_output(value: &Value, max_marks: f64) -> Result<ScoreOutcome, ScorerError> {
    let marks = value.get("marks_awarded").and_then(Value::as_f64);
    let feedback = value
        .get("feedback")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|f| !f.is_empty());

    match (marks, feedback) {
        (Some(marks), Some(feedback)) => Ok(ScoreOutcome {
            marks_awarded: check_marks(marks, max_marks)?,
            feedback: feedback.to_string(),
        }),
        (None, _) => Err(ScorerError::InvalidOutput(
            "missing numeric 'marks_awarded'".to_string(),
        )),
        (_, None) => Err(ScorerError::InvalidOutput(
            "missing non-empty 'feedback'".to_string(),
        )),
    }
}

fn parse_structured_text(text: &str, max_marks: f64) -> Result<ScoreOutcome, ScorerError> {
    let mut marks = None;
    let mut feedback_lines: Vec<&str> = Vec::new();
    let mut in_feedback = false;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(raw) = line.strip_prefix(MARKS_PREFIX) {
            if marks.is_none() {
                marks = MARKS_VALUE
                    .captures(raw)
                    .and_then(|c| c[1].parse::<f64>().ok())
                    .and_then(|m| check_marks(m, max_marks).ok());
            }
        } else if let Some(rest) = line.strip_prefix(FEEDBACK_PREFIX) {
            feedback_lines.push(rest.trim());
            in_feedback = true;
        } else if in_feedback {
            feedback_lines.push(line);
        }
    }

    let marks = marks.ok_or_else(|| {
        ScorerError::InvalidOutput(format!(
            "no valid '{MARKS_PREFIX}' line within [0, {max_marks}]"
        ))
    })?;
    let feedback = feedback_lines.join("\n").trim().to_string();
    if feedback.is_empty() {
        return Err(ScorerError::InvalidOutput(format!(
            "no '{FEEDBACK_PREFIX}' content"
        )));
    }

    Ok(ScoreOutcome {
        marks_awarded: marks,
        feedback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exams::entities::QuestionType;

    fn request(answer: &str, word_limit: Option<i32>) -> ScoreRequest {
        ScoreRequest {
            question_type: QuestionType::LongAnswer,
            question_text: "Explain interior mutability.".to_string(),
            answer_text: answer.to_string(),
            max_marks: 10.0,
            word_limit,
        }
    }

    #[test]
    fn test_prompt_contains_question_context() {
        let prompt = build_prompt(&request("Cell and RefCell", Some(200)));
        assert!(prompt.contains("Maximum Marks for this question: 10"));
        assert!(prompt.contains("Question Type: long_answer"));
        assert!(prompt.contains("Approximately 200 words"));
        assert!(prompt.contains("Cell and RefCell"));
        assert!(prompt.contains("\"marks_awarded\""));
    }

    #[test]
    fn test_prompt_marks_missing_answer() {
        let prompt = build_prompt(&request("   ", None));
        assert!(prompt.contains("(No answer provided)"));
        assert!(!prompt.contains("Word Limit"));
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"marks_awarded\": 6.5, \"feedback\": \"Clear but brief.\"}\n```";
        let outcome = parse_evaluation_output(raw, 10.0).unwrap();
        assert_eq!(outcome.marks_awarded, 6.5);
        assert_eq!(outcome.feedback, "Clear but brief.");
    }

    #[test]
    fn test_parse_json_out_of_range() {
        let raw = "{\"marks_awarded\": 11, \"feedback\": \"Too generous.\"}";
        assert!(matches!(
            parse_evaluation_output(raw, 10.0),
            Err(ScorerError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_parse_json_requires_feedback() {
        let raw = "{\"marks_awarded\": 4, \"feedback\": \"  \"}";
        assert!(parse_evaluation_output(raw, 10.0).is_err());
    }

    #[test]
    fn test_parse_structured_text_fallback() {
        let raw = "Marks: 7\nFeedback: Covers RefCell.\nMisses Mutex.";
        let outcome = parse_evaluation_output(raw, 10.0).unwrap();
        assert_eq!(outcome.marks_awarded, 7.0);
        assert_eq!(outcome.feedback, "Covers RefCell.\nMisses Mutex.");
    }

    #[test]
    fn test_parse_marks_with_denominator() {
        let outcome = parse_evaluation_output("Marks: 6.5/10\nFeedback: Solid.", 10.0).unwrap();
        assert_eq!(outcome.marks_awarded, 6.5);

        let outcome = parse_evaluation_output("Marks: **8** out of 10\nFeedback: Good.", 10.0).unwrap();
        assert_eq!(outcome.marks_awarded, 8.0);

        assert!(parse_evaluation_output("Marks: 12/10\nFeedback: Too generous.", 10.0).is_err());
    }

    #[test]
    fn test_parse_structured_text_without_marks() {
        assert!(parse_evaluation_output("Feedback: fine", 10.0).is_err());
        assert!(parse_evaluation_output("", 10.0).is_err());
    }
}
