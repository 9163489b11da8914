use std::collections::HashSet;

use tracing::warn;

use super::answer::TypedAnswer;
use super::weights::effective_weight;
use crate::error::MatchError;
use crate::model::{AnswerValue, QuestionType};

/// 旧形式（5段階のみ）の尺度上限
pub const LIKERT_SCALE_MAX: f64 = 5.0;

fn ensure_same_len(expected: usize, actual: usize) -> Result<(), MatchError> {
    if expected != actual {
        warn!(
            expected,
            actual, "answer vector dimension mismatch; catalog and vectors are misaligned"
        );
        return Err(MatchError::LengthMismatch { expected, actual });
    }
    Ok(())
}

/// コサイン類似度。どちらかがゼロベクトルなら 0.0（一致ではなく「信号なし」）。
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, MatchError> {
    ensure_same_len(a.len(), b.len())?;

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

/// 次元ごとの重み付きコサイン類似度
pub fn weighted_cosine_similarity(
    a: &[f64],
    b: &[f64],
    weights: &[f64],
) -> Result<f64, MatchError> {
    ensure_same_len(a.len(), b.len())?;
    ensure_same_len(a.len(), weights.len())?;

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for ((x, y), w) in a.iter().zip(b).zip(weights) {
        let w = effective_weight(*w);
        dot += w * x * y;
        norm_a += w * x * x;
        norm_b += w * y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// 順序尺度の距離類似度: `1 - |u - c| / (max - 1)`
pub fn scale_distance_similarity(user: f64, candidate: f64, scale_max: f64) -> f64 {
    if scale_max <= 1.0 {
        return if user == candidate { 1.0 } else { 0.0 };
    }
    (1.0 - (user - candidate).abs() / (scale_max - 1.0)).clamp(0.0, 1.0)
}

pub fn exact_match_similarity(user: &AnswerValue, candidate: &AnswerValue) -> f64 {
    if user.same_as(candidate) { 1.0 } else { 0.0 }
}

/// Jaccard 係数。両方空なら完全一致（1.0）。
pub fn set_similarity<'a, U, C>(user: U, candidate: C) -> f64
where
    U: IntoIterator<Item = &'a str>,
    C: IntoIterator<Item = &'a str>,
{
    let user: HashSet<&str> = collect_tokens(user);
    let candidate: HashSet<&str> = collect_tokens(candidate);
    jaccard(&user, &candidate)
}

fn collect_tokens<'a, I>(tokens: I) -> HashSet<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens
        .into_iter()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

fn jaccard<'a>(user: &HashSet<&'a str>, candidate: &HashSet<&'a str>) -> f64 {
    if user.is_empty() && candidate.is_empty() {
        return 1.0;
    }

    let intersection = user.intersection(candidate).count();
    let union = user.union(candidate).count();
    intersection as f64 / union as f64
}

/// 設問タイプに応じて比較方法を切り替える
pub fn similarity_for_question(
    user: &AnswerValue,
    candidate: &AnswerValue,
    kind: &QuestionType,
) -> f64 {
    match (
        TypedAnswer::interpret(user, kind),
        TypedAnswer::interpret(candidate, kind),
    ) {
        (TypedAnswer::Scale { value: u, max }, TypedAnswer::Scale { value: c, .. }) => {
            scale_distance_similarity(u, c, max)
        }
        (TypedAnswer::Selection(u), TypedAnswer::Selection(c)) => jaccard(&u, &c),
        _ => exact_match_similarity(user, candidate),
    }
}

/// 両者が回答した（0 でない）次元だけで 5 段階距離類似度を平均する。
/// 共通の回答がなければ 0.0。
pub fn mean_scale_distance_similarity(
    a: &[f64],
    b: &[f64],
    weights: Option<&[f64]>,
) -> Result<f64, MatchError> {
    ensure_same_len(a.len(), b.len())?;
    if let Some(weights) = weights {
        ensure_same_len(a.len(), weights.len())?;
    }

    let mut total = 0.0;
    let mut weight_sum = 0.0;

    for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
        if x == 0.0 || y == 0.0 {
            continue;
        }
        let w = weights.map(|ws| effective_weight(ws[i])).unwrap_or(1.0);
        total += w * scale_distance_similarity(x, y, LIKERT_SCALE_MAX);
        weight_sum += w;
    }

    if weight_sum == 0.0 {
        return Ok(0.0);
    }
    Ok(total / weight_sum)
}
