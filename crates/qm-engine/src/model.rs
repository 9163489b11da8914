//! Read-only input records handed over by the data-acquisition layer.
//!
//! Field names follow the JSON shape that layer produces: candidate records
//! keep their snake_case columns (`link_url`), answer and weight records are
//! camelCase (`candidateId`, `questionId`, `topicId`).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::MatchError;

/// Multiple-select answers are stored as one string joined by this delimiter.
pub const SELECTION_DELIMITER: char = '|';

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub party: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub link_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
}

/// 設問・トピックの区分（全国 / 地域）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    General,
    Local,
}

/// Legacy question: always a 5-point agreement scale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

/// Answer type tag of an SVO question.
///
/// Unknown tags are kept verbatim in `Unknown` and compared with exact-match
/// semantics instead of being rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    #[default]
    Agree5,
    Support3,
    Pick1Of3,
    Pick1Of4,
    Pick1Of5,
    BinaryChoice,
    MultipleChoice,
    Unknown(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::Agree5 => "agree_5",
            QuestionType::Support3 => "support_3",
            QuestionType::Pick1Of3 => "pick_1_3",
            QuestionType::Pick1Of4 => "pick_1_4",
            QuestionType::Pick1Of5 => "pick_1_5",
            QuestionType::BinaryChoice => "binary_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Unknown(tag) => tag,
        }
    }

    /// Ordinal scales carry their maximum point; categorical types return `None`.
    pub fn scale_max(&self) -> Option<f64> {
        match self {
            QuestionType::Agree5 => Some(5.0),
            QuestionType::Support3 => Some(3.0),
            _ => None,
        }
    }

    pub fn is_multiple_select(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice)
    }
}

impl From<&str> for QuestionType {
    fn from(raw: &str) -> Self {
        let tag = raw.trim();
        match tag.to_ascii_lowercase().as_str() {
            // 空欄はシート側の既定値（agree_5）として扱う
            "" | "agree_5" => QuestionType::Agree5,
            "support_3" => QuestionType::Support3,
            "pick_1_3" => QuestionType::Pick1Of3,
            "pick_1_4" => QuestionType::Pick1Of4,
            "pick_1_5" => QuestionType::Pick1Of5,
            "binary_choice" => QuestionType::BinaryChoice,
            "multiple_choice" => QuestionType::MultipleChoice,
            _ => QuestionType::Unknown(tag.to_string()),
        }
    }
}

impl From<String> for QuestionType {
    fn from(raw: String) -> Self {
        QuestionType::from(raw.as_str())
    }
}

impl From<QuestionType> for String {
    fn from(kind: QuestionType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 設問の優先度。大文字小文字は問わず、不明な値は `Essential`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    #[default]
    Essential,
    Additional,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Essential => "Essential",
            Priority::Additional => "Additional",
        }
    }
}

impl From<&str> for Priority {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "additional" | "optional" => Priority::Additional,
            _ => Priority::Essential,
        }
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        Priority::from(raw.as_str())
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.as_str().to_string()
    }
}

/// Extended question with an explicit answer type, priority and active flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSvo {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: QuestionType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub active: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Sheets export the active column either as a JSON bool or as "TRUE"/"FALSE".
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(value) => value.trim().eq_ignore_ascii_case("true"),
    })
}

/// Raw SVO answer value: a scale point or an option label (pipe-joined for
/// multiple-select questions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
}

impl AnswerValue {
    /// Empty text and non-finite numbers count as "not answered".
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Number(value) => !value.is_finite(),
            AnswerValue::Text(value) => value.trim().is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(value) => Some(*value).filter(|v| v.is_finite()),
            AnswerValue::Text(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(value) => Some(value.as_str()),
            AnswerValue::Number(_) => None,
        }
    }

    /// Equality used by categorical questions: trimmed text, numeric value
    /// across the number/text boundary.
    pub fn same_as(&self, other: &AnswerValue) -> bool {
        match (self, other) {
            (AnswerValue::Number(a), AnswerValue::Number(b)) => a == b,
            (AnswerValue::Text(a), AnswerValue::Text(b)) => a.trim() == b.trim(),
            (AnswerValue::Number(n), AnswerValue::Text(t))
            | (AnswerValue::Text(t), AnswerValue::Number(n)) => t
                .trim()
                .parse::<f64>()
                .map(|parsed| parsed == *n)
                .unwrap_or(false),
        }
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<i32> for AnswerValue {
    fn from(value: i32) -> Self {
        AnswerValue::Number(f64::from(value))
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateAnswer {
    pub candidate_id: String,
    pub question_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateAnswerSvo {
    pub candidate_id: String,
    pub question_id: String,
    #[serde(default)]
    pub value: Option<AnswerValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswerSvo {
    pub question_id: String,
    #[serde(default)]
    pub value: Option<AnswerValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Scope>,
}

/// ユーザーが申告するトピック重要度（未指定は 1）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTopicWeight {
    pub topic_id: String,
    pub weight: f64,
}

/// Candidate-declared topic priority. Carried for the presentation layer;
/// scoring does not read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicImportance {
    pub candidate_id: String,
    pub topic_id: String,
    pub weight: f64,
}

/// Legacy quiz bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizData {
    pub candidates: Vec<Candidate>,
    pub questions: Vec<Question>,
    pub candidate_answers: Vec<CandidateAnswer>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub topic_importance: Vec<TopicImportance>,
}

impl QuizData {
    pub fn from_json(raw: &str) -> Result<Self, MatchError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// SVO quiz bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDataSvo {
    pub candidates: Vec<Candidate>,
    pub questions: Vec<QuestionSvo>,
    pub candidate_answers: Vec<CandidateAnswerSvo>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub topic_importance: Vec<TopicImportance>,
}

impl QuizDataSvo {
    pub fn from_json(raw: &str) -> Result<Self, MatchError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn active_questions(&self) -> impl Iterator<Item = &QuestionSvo> {
        self.questions.iter().filter(|q| q.active)
    }
}
