use std::str::FromStr;

use tracing::warn;

use crate::matching::normalize::{AbsoluteCurve, DEFAULT_TOPIC_SPREAD_THRESHOLD, ScoreBand};

/// Raw-score metric used by the legacy (5-point only) calculators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LegacyMetric {
    /// Cosine similarity over the full answer vectors. Collinear answer sets
    /// (e.g. a single question answered 5 vs 1) score 1.0.
    #[default]
    Cosine,
    /// Mean 5-point scale-distance similarity over questions both sides answered.
    ScaleDistance,
}

impl FromStr for LegacyMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(LegacyMetric::Cosine),
            "scale_distance" | "distance" => Ok(LegacyMetric::ScaleDistance),
            other => Err(format!("unknown legacy metric: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingConfig {
    /// 表示帯（20〜100）と絶対評価の曲線
    pub band: ScoreBand,
    /// トピック別スコアを相対評価に切り替える最小の広がり
    pub topic_spread_threshold: f64,
    pub legacy_metric: LegacyMetric,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            band: ScoreBand::default(),
            topic_spread_threshold: DEFAULT_TOPIC_SPREAD_THRESHOLD,
            legacy_metric: LegacyMetric::Cosine,
        }
    }
}

impl MatchingConfig {
    /// 環境変数から設定を読み込み（未設定・不正値は既定値）
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Malformed values are
    /// logged and replaced by their defaults; an inconsistent band is reset
    /// as a whole.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let band = ScoreBand {
            floor: parse_or(&lookup, "QM_SCORE_FLOOR", defaults.band.floor),
            ceiling: parse_or(&lookup, "QM_SCORE_CEILING", defaults.band.ceiling),
            perfect_threshold: parse_or(
                &lookup,
                "QM_PERFECT_THRESHOLD",
                defaults.band.perfect_threshold,
            ),
            curve: parse_or(&lookup, "QM_ABSOLUTE_CURVE", defaults.band.curve),
        };

        let band = if band.is_valid() {
            band
        } else {
            warn!(
                floor = band.floor,
                ceiling = band.ceiling,
                "invalid score band; falling back to defaults"
            );
            ScoreBand {
                curve: band.curve,
                ..defaults.band
            }
        };

        let topic_spread_threshold = parse_or(
            &lookup,
            "QM_TOPIC_SPREAD_THRESHOLD",
            defaults.topic_spread_threshold,
        );
        let topic_spread_threshold =
            if topic_spread_threshold.is_finite() && topic_spread_threshold >= 0.0 {
                topic_spread_threshold
            } else {
                warn!(
                    value = topic_spread_threshold,
                    "invalid topic spread threshold; falling back to default"
                );
                defaults.topic_spread_threshold
            };

        Self {
            band,
            topic_spread_threshold,
            legacy_metric: parse_or(&lookup, "QM_LEGACY_METRIC", defaults.legacy_metric),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, "unparseable config value; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_display_band() {
        let config = MatchingConfig::from_lookup(|_| None);

        assert_eq!(config, MatchingConfig::default());
        assert_eq!(config.band.floor, 20.0);
        assert_eq!(config.band.ceiling, 100.0);
        assert_eq!(config.band.perfect_threshold, 0.9999);
        assert_eq!(config.topic_spread_threshold, 0.1);
        assert_eq!(config.legacy_metric, LegacyMetric::Cosine);
    }

    #[test]
    fn reads_overrides() {
        let config = MatchingConfig::from_lookup(lookup_from(&[
            ("QM_SCORE_FLOOR", "10"),
            ("QM_SCORE_CEILING", "90"),
            ("QM_ABSOLUTE_CURVE", "power"),
            ("QM_TOPIC_SPREAD_THRESHOLD", "0.2"),
            ("QM_LEGACY_METRIC", "scale_distance"),
        ]));

        assert_eq!(config.band.floor, 10.0);
        assert_eq!(config.band.ceiling, 90.0);
        assert_eq!(config.band.curve, AbsoluteCurve::Power);
        assert_eq!(config.topic_spread_threshold, 0.2);
        assert_eq!(config.legacy_metric, LegacyMetric::ScaleDistance);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let config = MatchingConfig::from_lookup(lookup_from(&[
            ("QM_SCORE_FLOOR", "twenty"),
            ("QM_LEGACY_METRIC", "euclid"),
            ("QM_TOPIC_SPREAD_THRESHOLD", "-1"),
        ]));

        assert_eq!(config.band.floor, 20.0);
        assert_eq!(config.legacy_metric, LegacyMetric::Cosine);
        assert_eq!(config.topic_spread_threshold, 0.1);
    }

    #[test]
    fn inverted_band_resets_but_keeps_curve() {
        let config = MatchingConfig::from_lookup(lookup_from(&[
            ("QM_SCORE_FLOOR", "80"),
            ("QM_SCORE_CEILING", "30"),
            ("QM_ABSOLUTE_CURVE", "power"),
        ]));

        assert_eq!(config.band.floor, 20.0);
        assert_eq!(config.band.ceiling, 100.0);
        assert_eq!(config.band.curve, AbsoluteCurve::Power);
    }
}
