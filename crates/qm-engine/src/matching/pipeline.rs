use serde::Serialize;

use crate::config::MatchingConfig;
use crate::model::Candidate;

/// トピック別の一致度
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMatch {
    pub topic_id: String,
    pub topic_name: String,
    pub match_percentage: u8,
}

/// Ranked legacy result. Serializes as the candidate's own fields plus the
/// match fields, the way the presentation layer expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMatch {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub match_percentage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_matches: Option<Vec<TopicMatch>>,
    /// 正規化前の類似度
    #[serde(skip)]
    pub raw_score: f64,
}

/// Ranked SVO result with participation figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SvoCandidateMatch {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub match_percentage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_matches: Option<Vec<TopicMatch>>,
    /// 回答済みアクティブ設問の割合（0.0〜1.0）
    pub participation_rate: f64,
    pub answered_questions: usize,
    pub total_questions: usize,
}

/// スコア計算の入口。設定以外の状態は持たない。
#[derive(Debug, Clone, Default)]
pub struct MatchEngine {
    config: MatchingConfig,
}

impl MatchEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(MatchingConfig::from_env())
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }
}

/// 一致度の降順で安定ソート（同点は入力順を維持）
pub(crate) fn sort_by_percentage_desc<T>(items: &mut [T], percentage: impl Fn(&T) -> u8) {
    items.sort_by(|a, b| percentage(b).cmp(&percentage(a)));
}
