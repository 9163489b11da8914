//! 生の類似度（0.0〜1.0）を表示用パーセンテージへ変換する。
//!
//! The display band defaults to 20–100. A batch with no spread is mapped
//! absolutely instead of min-max.

use std::str::FromStr;

/// 表示帯の下限
pub const DEFAULT_FLOOR: f64 = 20.0;
/// 表示帯の上限
pub const DEFAULT_CEILING: f64 = 100.0;
/// これ以上の類似度は完全一致として上限に丸める
pub const DEFAULT_PERFECT_THRESHOLD: f64 = 0.9999;
/// トピック別スコアの広がりがこれ未満なら絶対評価に切り替える
pub const DEFAULT_TOPIC_SPREAD_THRESHOLD: f64 = 0.1;

/// Shape of the absolute mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbsoluteCurve {
    #[default]
    Linear,
    /// `s^1.5` before scaling; spreads the high end further apart.
    Power,
}

impl FromStr for AbsoluteCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(AbsoluteCurve::Linear),
            "power" => Ok(AbsoluteCurve::Power),
            other => Err(format!("unknown absolute curve: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBand {
    pub floor: f64,
    pub ceiling: f64,
    pub perfect_threshold: f64,
    pub curve: AbsoluteCurve,
}

impl Default for ScoreBand {
    fn default() -> Self {
        Self {
            floor: DEFAULT_FLOOR,
            ceiling: DEFAULT_CEILING,
            perfect_threshold: DEFAULT_PERFECT_THRESHOLD,
            curve: AbsoluteCurve::Linear,
        }
    }
}

impl ScoreBand {
    /// floor < ceiling かつ 0〜100 に収まっているか
    pub fn is_valid(&self) -> bool {
        self.floor.is_finite()
            && self.ceiling.is_finite()
            && self.floor >= 0.0
            && self.ceiling <= 100.0
            && self.floor < self.ceiling
            && self.perfect_threshold.is_finite()
    }

    fn span(&self) -> f64 {
        self.ceiling - self.floor
    }

    /// 他候補に依存しない絶対評価
    pub fn absolute_percentage(&self, similarity: f64) -> u8 {
        if similarity >= self.perfect_threshold {
            return to_percentage(self.ceiling);
        }
        if similarity <= 0.0 {
            return to_percentage(self.floor);
        }

        let shaped = match self.curve {
            AbsoluteCurve::Linear => similarity,
            AbsoluteCurve::Power => similarity.powf(1.5),
        };
        to_percentage(self.floor + shaped * self.span())
    }

    /// min-max による相対評価（max > min が前提）
    pub fn relative_percentage(&self, similarity: f64, min: f64, max: f64) -> u8 {
        to_percentage(self.floor + (similarity - min) / (max - min) * self.span())
    }

    /// 候補全体のスコアを一括正規化する
    pub fn normalize(&self, scores: &[f64]) -> Vec<u8> {
        let Some((min, max)) = bounds(scores) else {
            return Vec::new();
        };

        if max == min {
            return scores
                .iter()
                .map(|&s| self.absolute_percentage(s))
                .collect();
        }

        scores
            .iter()
            .map(|&s| self.relative_percentage(s, min, max))
            .collect()
    }

    /// トピック単位の正規化。広がりが閾値未満なら絶対評価。
    pub fn normalize_topic(&self, scores: &[f64], spread_threshold: f64) -> Vec<u8> {
        let Some((min, max)) = bounds(scores) else {
            return Vec::new();
        };

        if max - min < spread_threshold {
            scores
                .iter()
                .map(|&s| self.absolute_percentage(s))
                .collect()
        } else {
            self.normalize(scores)
        }
    }
}

/// Batch normalization with the default 20–100 band.
pub fn normalize_scores(scores: &[f64]) -> Vec<u8> {
    ScoreBand::default().normalize(scores)
}

/// Absolute 20–100 mapping of a single raw score.
pub fn absolute_percentage(similarity: f64) -> u8 {
    ScoreBand::default().absolute_percentage(similarity)
}

/// Absolute mapping through the power curve (`20 + 80·s^1.5`).
pub fn power_curve_percentage(similarity: f64) -> u8 {
    ScoreBand {
        curve: AbsoluteCurve::Power,
        ..ScoreBand::default()
    }
    .absolute_percentage(similarity)
}

/// 平均類似度（0.0〜1.0）をそのまま 0〜100 に丸める（SVO 用）
pub fn ratio_to_percentage(ratio: f64) -> u8 {
    to_percentage(ratio * 100.0)
}

fn to_percentage(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

fn bounds(scores: &[f64]) -> Option<(f64, f64)> {
    if scores.is_empty() {
        return None;
    }
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}
