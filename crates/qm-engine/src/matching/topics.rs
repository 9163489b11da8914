//! トピック単位の集計
//!
//! Questions whose topic id is not in the catalog never reach an aggregate;
//! they are dropped here rather than reported as errors.

use std::collections::HashMap;

use super::weights::TopicWeights;
use crate::model::{Question, Topic};

/// Indices into the catalog-ordered question list, grouped per topic.
#[derive(Debug, Clone)]
pub struct TopicQuestions<'t> {
    pub topic: &'t Topic,
    pub indices: Vec<usize>,
}

/// トピックごとの設問インデックス（カタログ順）。設問 0 件のトピックは空の `indices` で残る。
pub fn topic_question_indices<'t>(
    topics: &'t [Topic],
    questions: &[Question],
) -> Vec<TopicQuestions<'t>> {
    topics
        .iter()
        .map(|topic| TopicQuestions {
            topic,
            indices: questions
                .iter()
                .enumerate()
                .filter(|(_, q)| q.topic == topic.id)
                .map(|(i, _)| i)
                .collect(),
        })
        .collect()
}

/// Picks the listed dimensions out of a vector.
pub fn project(vector: &[f64], indices: &[usize]) -> Vec<f64> {
    indices
        .iter()
        .filter_map(|&i| vector.get(i).copied())
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
struct Running {
    sum: f64,
    count: usize,
}

/// Per-topic running mean of question similarities for one candidate.
#[derive(Debug, Clone)]
pub struct TopicAggregator<'t> {
    topics: &'t [Topic],
    index: HashMap<&'t str, usize>,
    totals: Vec<Running>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopicAverage<'t> {
    pub topic: &'t Topic,
    pub average: f64,
}

impl<'t> TopicAggregator<'t> {
    pub fn new(topics: &'t [Topic]) -> Self {
        let mut index = HashMap::with_capacity(topics.len());
        for (i, topic) in topics.iter().enumerate() {
            index.entry(topic.id.as_str()).or_insert(i);
        }
        Self {
            topics,
            index,
            totals: vec![Running::default(); topics.len()],
        }
    }

    /// 未知のトピックなら false を返して何もしない
    pub fn record(&mut self, topic_id: &str, similarity: f64) -> bool {
        let Some(&i) = self.index.get(topic_id) else {
            return false;
        };
        let running = &mut self.totals[i];
        running.sum += similarity;
        running.count += 1;
        true
    }

    /// 1 件以上記録されたトピックの平均（カタログ順）
    pub fn averages(&self) -> Vec<TopicAverage<'t>> {
        self.topics
            .iter()
            .zip(&self.totals)
            .filter(|(_, running)| running.count > 0)
            .map(|(topic, running)| TopicAverage {
                topic,
                average: running.sum / running.count as f64,
            })
            .collect()
    }

    /// Weighted mean of the topic averages; `None` when nothing was recorded.
    pub fn weighted_mean(&self, weights: &TopicWeights<'_>) -> Option<f64> {
        let mut total = 0.0;
        let mut weight_sum = 0.0;

        for avg in self.averages() {
            let w = weights.weight_for(&avg.topic.id);
            total += w * avg.average;
            weight_sum += w;
        }

        (weight_sum > 0.0).then(|| total / weight_sum)
    }
}
