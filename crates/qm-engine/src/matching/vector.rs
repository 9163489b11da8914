use std::collections::HashMap;

use crate::model::{CandidateAnswer, Question, UserAnswer};

/// 未回答の次元に入る中立値
pub const MISSING_ANSWER: f64 = 0.0;

/// 設問カタログの順序で回答ベクトルを組み立てる
#[derive(Debug, Clone)]
pub struct VectorBuilder<'q> {
    question_ids: Vec<&'q str>,
}

impl<'q> VectorBuilder<'q> {
    pub fn new(questions: &'q [Question]) -> Self {
        Self {
            question_ids: questions.iter().map(|q| q.id.as_str()).collect(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.question_ids.len()
    }

    pub fn question_ids(&self) -> &[&'q str] {
        &self.question_ids
    }

    /// Answers are indexed once; the first answer for a question wins and
    /// unanswered questions read as 0.
    pub fn build<'a, I>(&self, answers: I) -> Vec<f64>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut by_question: HashMap<&str, f64> = HashMap::new();
        for (question_id, value) in answers {
            by_question.entry(question_id).or_insert(value);
        }

        self.question_ids
            .iter()
            .map(|id| by_question.get(id).copied().unwrap_or(MISSING_ANSWER))
            .collect()
    }

    pub fn user_vector(&self, answers: &[UserAnswer]) -> Vec<f64> {
        self.build(answers.iter().map(|a| (a.question_id.as_str(), a.value)))
    }

    pub fn candidate_vector(&self, answers: &[&CandidateAnswer]) -> Vec<f64> {
        self.build(answers.iter().map(|a| (a.question_id.as_str(), a.value)))
    }
}

/// 候補者 ID ごとに回答をまとめる（入力順を保持）
pub fn group_by_candidate(answers: &[CandidateAnswer]) -> HashMap<&str, Vec<&CandidateAnswer>> {
    let mut grouped: HashMap<&str, Vec<&CandidateAnswer>> = HashMap::new();
    for answer in answers {
        grouped
            .entry(answer.candidate_id.as_str())
            .or_default()
            .push(answer);
    }
    grouped
}
