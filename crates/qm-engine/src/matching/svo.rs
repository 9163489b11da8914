//! SVO 形式（設問タイプ混在）の一致度計算
//!
//! Unlike the legacy model, an unanswered question is not treated as 0: it is
//! left out of the average entirely and only shows up in the candidate's
//! participation rate.

use std::collections::HashMap;

use tracing::{debug, instrument};

use super::normalize::ratio_to_percentage;
use super::pipeline::{MatchEngine, SvoCandidateMatch, TopicMatch, sort_by_percentage_desc};
use super::similarity::similarity_for_question;
use super::topics::TopicAggregator;
use super::weights::TopicWeights;
use crate::model::{
    AnswerValue, Candidate, CandidateAnswerSvo, QuestionSvo, Topic, UserAnswerSvo,
    UserTopicWeight,
};

/// 回答あり（null でも空文字でもない）か
fn answered(value: Option<&AnswerValue>) -> Option<&AnswerValue> {
    value.filter(|v| !v.is_blank())
}

/// First record per question wins, even when that record is empty.
fn index_user_answers(answers: &[UserAnswerSvo]) -> HashMap<&str, Option<&AnswerValue>> {
    let mut by_question = HashMap::with_capacity(answers.len());
    for answer in answers {
        by_question
            .entry(answer.question_id.as_str())
            .or_insert(answer.value.as_ref());
    }
    by_question
}

fn index_candidate_answers(
    answers: &[CandidateAnswerSvo],
) -> HashMap<(&str, &str), Option<&AnswerValue>> {
    let mut by_pair = HashMap::with_capacity(answers.len());
    for answer in answers {
        by_pair
            .entry((answer.candidate_id.as_str(), answer.question_id.as_str()))
            .or_insert(answer.value.as_ref());
    }
    by_pair
}

/// 候補者 1 名分の設問ごとの比較結果
struct Evaluation<'q> {
    /// 双方回答済みの設問とその類似度
    compared: Vec<(&'q QuestionSvo, f64)>,
    answered: usize,
    total: usize,
}

impl Evaluation<'_> {
    fn participation_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.answered as f64 / self.total as f64
    }

    fn mean_similarity(&self) -> Option<f64> {
        if self.compared.is_empty() {
            return None;
        }
        let sum: f64 = self.compared.iter().map(|(_, s)| s).sum();
        Some(sum / self.compared.len() as f64)
    }
}

struct SvoIndex<'a> {
    active: Vec<&'a QuestionSvo>,
    user: HashMap<&'a str, Option<&'a AnswerValue>>,
    candidate: HashMap<(&'a str, &'a str), Option<&'a AnswerValue>>,
}

impl<'a> SvoIndex<'a> {
    fn new(
        user_answers: &'a [UserAnswerSvo],
        candidate_answers: &'a [CandidateAnswerSvo],
        questions: &'a [QuestionSvo],
    ) -> Self {
        Self {
            active: questions.iter().filter(|q| q.active).collect(),
            user: index_user_answers(user_answers),
            candidate: index_candidate_answers(candidate_answers),
        }
    }

    fn evaluate(&self, candidate: &Candidate) -> Evaluation<'a> {
        let mut compared = Vec::with_capacity(self.active.len());
        let mut answered_count = 0;

        for &question in &self.active {
            let candidate_value = self
                .candidate
                .get(&(candidate.id.as_str(), question.id.as_str()))
                .copied()
                .flatten();
            let Some(candidate_value) = answered(candidate_value) else {
                continue;
            };
            answered_count += 1;

            let user_value = self.user.get(question.id.as_str()).copied().flatten();
            if let Some(user_value) = answered(user_value) {
                let similarity = similarity_for_question(user_value, candidate_value, &question.kind);
                compared.push((question, similarity));
            }
        }

        Evaluation {
            compared,
            answered: answered_count,
            total: self.active.len(),
        }
    }
}

impl MatchEngine {
    /// 双方が回答した設問の平均類似度で候補者を並べる
    #[instrument(
        skip_all,
        fields(candidates = candidates.len(), questions = questions.len())
    )]
    pub fn calculate_svo_matches(
        &self,
        user_answers: &[UserAnswerSvo],
        candidate_answers: &[CandidateAnswerSvo],
        candidates: &[Candidate],
        questions: &[QuestionSvo],
    ) -> Vec<SvoCandidateMatch> {
        let index = SvoIndex::new(user_answers, candidate_answers, questions);

        let mut matches: Vec<SvoCandidateMatch> = candidates
            .iter()
            .map(|candidate| {
                let eval = index.evaluate(candidate);
                SvoCandidateMatch {
                    candidate: candidate.clone(),
                    match_percentage: eval.mean_similarity().map_or(0, ratio_to_percentage),
                    topic_matches: None,
                    participation_rate: eval.participation_rate(),
                    answered_questions: eval.answered,
                    total_questions: eval.total,
                }
            })
            .collect();

        sort_by_percentage_desc(&mut matches, |m| m.match_percentage);
        debug!(
            ranked = matches.len(),
            active_questions = index.active.len(),
            "svo matches calculated"
        );
        matches
    }

    /// Topic-weighted SVO scoring: similarities are averaged per topic, then
    /// the topic averages are combined with the user's topic weights.
    #[instrument(
        skip_all,
        fields(
            candidates = candidates.len(),
            questions = questions.len(),
            topics = topics.len()
        )
    )]
    pub fn calculate_weighted_svo_matches(
        &self,
        user_answers: &[UserAnswerSvo],
        user_topic_weights: &[UserTopicWeight],
        candidate_answers: &[CandidateAnswerSvo],
        candidates: &[Candidate],
        questions: &[QuestionSvo],
        topics: &[Topic],
    ) -> Vec<SvoCandidateMatch> {
        let index = SvoIndex::new(user_answers, candidate_answers, questions);
        let weights = TopicWeights::new(user_topic_weights);
        let mut dropped = 0usize;

        let mut matches: Vec<SvoCandidateMatch> = candidates
            .iter()
            .map(|candidate| {
                let eval = index.evaluate(candidate);

                let mut aggregator = TopicAggregator::new(topics);
                for (question, similarity) in &eval.compared {
                    if !aggregator.record(&question.topic, *similarity) {
                        dropped += 1;
                    }
                }

                let mut topic_matches: Vec<TopicMatch> = aggregator
                    .averages()
                    .into_iter()
                    .map(|avg| TopicMatch {
                        topic_id: avg.topic.id.clone(),
                        topic_name: avg.topic.name.clone(),
                        match_percentage: ratio_to_percentage(avg.average),
                    })
                    .collect();
                sort_by_percentage_desc(&mut topic_matches, |t| t.match_percentage);

                SvoCandidateMatch {
                    candidate: candidate.clone(),
                    match_percentage: aggregator
                        .weighted_mean(&weights)
                        .map_or(0, ratio_to_percentage),
                    topic_matches: Some(topic_matches),
                    participation_rate: eval.participation_rate(),
                    answered_questions: eval.answered,
                    total_questions: eval.total,
                }
            })
            .collect();

        sort_by_percentage_desc(&mut matches, |m| m.match_percentage);
        debug!(
            ranked = matches.len(),
            active_questions = index.active.len(),
            unresolved_topic_answers = dropped,
            "weighted svo matches calculated"
        );
        matches
    }
}

/// [`MatchEngine::calculate_svo_matches`] with the default configuration.
pub fn calculate_svo_matches(
    user_answers: &[UserAnswerSvo],
    candidate_answers: &[CandidateAnswerSvo],
    candidates: &[Candidate],
    questions: &[QuestionSvo],
) -> Vec<SvoCandidateMatch> {
    MatchEngine::default().calculate_svo_matches(
        user_answers,
        candidate_answers,
        candidates,
        questions,
    )
}

/// [`MatchEngine::calculate_weighted_svo_matches`] with the default configuration.
pub fn calculate_weighted_svo_matches(
    user_answers: &[UserAnswerSvo],
    user_topic_weights: &[UserTopicWeight],
    candidate_answers: &[CandidateAnswerSvo],
    candidates: &[Candidate],
    questions: &[QuestionSvo],
    topics: &[Topic],
) -> Vec<SvoCandidateMatch> {
    MatchEngine::default().calculate_weighted_svo_matches(
        user_answers,
        user_topic_weights,
        candidate_answers,
        candidates,
        questions,
        topics,
    )
}
