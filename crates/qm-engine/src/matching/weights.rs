use std::collections::HashMap;

use crate::model::{Question, UserTopicWeight};

/// 未指定トピックの重み
pub const DEFAULT_TOPIC_WEIGHT: f64 = 1.0;

/// Zero, negative, NaN and infinite weights all count as the default weight.
pub fn effective_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        DEFAULT_TOPIC_WEIGHT
    }
}

/// ユーザーのトピック重みを topic_id で引けるようにしたもの
#[derive(Debug, Clone, Default)]
pub struct TopicWeights<'a> {
    by_topic: HashMap<&'a str, f64>,
}

impl<'a> TopicWeights<'a> {
    /// Later entries for the same topic replace earlier ones.
    pub fn new(weights: &'a [UserTopicWeight]) -> Self {
        let by_topic = weights
            .iter()
            .map(|w| (w.topic_id.as_str(), w.weight))
            .collect();
        Self { by_topic }
    }

    pub fn weight_for(&self, topic_id: &str) -> f64 {
        self.by_topic
            .get(topic_id)
            .copied()
            .map(effective_weight)
            .unwrap_or(DEFAULT_TOPIC_WEIGHT)
    }

    /// 設問順に並んだ重みベクトル
    pub fn question_weights(&self, questions: &[Question]) -> Vec<f64> {
        questions.iter().map(|q| self.weight_for(&q.topic)).collect()
    }
}
