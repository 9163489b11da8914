//! 旧形式（5段階のみ）の一致度計算

use tracing::{debug, instrument};

use super::pipeline::{CandidateMatch, MatchEngine, TopicMatch, sort_by_percentage_desc};
use super::similarity::{
    cosine_similarity, mean_scale_distance_similarity, weighted_cosine_similarity,
};
use super::topics::{project, topic_question_indices};
use super::vector::{VectorBuilder, group_by_candidate};
use super::weights::TopicWeights;
use crate::config::LegacyMetric;
use crate::error::MatchError;
use crate::model::{Candidate, CandidateAnswer, Question, Topic, UserAnswer, UserTopicWeight};

impl MatchEngine {
    /// 全候補者の一致度を計算し、降順で返す
    #[instrument(
        skip_all,
        fields(candidates = candidates.len(), questions = questions.len())
    )]
    pub fn calculate_matches(
        &self,
        user_answers: &[UserAnswer],
        candidate_answers: &[CandidateAnswer],
        candidates: &[Candidate],
        questions: &[Question],
    ) -> Result<Vec<CandidateMatch>, MatchError> {
        let builder = VectorBuilder::new(questions);
        let user_vector = builder.user_vector(user_answers);
        let by_candidate = group_by_candidate(candidate_answers);

        let raw_scores = candidates
            .iter()
            .map(|candidate| {
                let answers = by_candidate
                    .get(candidate.id.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let candidate_vector = builder.candidate_vector(answers);
                self.legacy_similarity(&user_vector, &candidate_vector, None)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let percentages = self.config().band.normalize(&raw_scores);

        let mut matches: Vec<CandidateMatch> = candidates
            .iter()
            .zip(raw_scores)
            .zip(percentages)
            .map(|((candidate, raw_score), match_percentage)| CandidateMatch {
                candidate: candidate.clone(),
                match_percentage,
                topic_matches: None,
                raw_score,
            })
            .collect();

        sort_by_percentage_desc(&mut matches, |m| m.match_percentage);
        debug!(
            ranked = matches.len(),
            top = ?matches.first().map(|m| m.match_percentage),
            "legacy matches calculated"
        );
        Ok(matches)
    }

    /// Topic-weighted variant. The overall score uses the per-question weight
    /// vector; each topic breakdown is an unweighted similarity over that
    /// topic's questions, normalized across candidates per topic.
    #[instrument(
        skip_all,
        fields(
            candidates = candidates.len(),
            questions = questions.len(),
            topics = topics.len()
        )
    )]
    pub fn calculate_weighted_matches(
        &self,
        user_answers: &[UserAnswer],
        user_topic_weights: &[UserTopicWeight],
        candidate_answers: &[CandidateAnswer],
        candidates: &[Candidate],
        questions: &[Question],
        topics: &[Topic],
    ) -> Result<Vec<CandidateMatch>, MatchError> {
        let builder = VectorBuilder::new(questions);
        let user_vector = builder.user_vector(user_answers);
        let weights = TopicWeights::new(user_topic_weights).question_weights(questions);
        let topic_groups = topic_question_indices(topics, questions);
        let by_candidate = group_by_candidate(candidate_answers);

        let mut raw_scores = Vec::with_capacity(candidates.len());
        // topic_raw[t][c]: トピック t における候補者 c の生スコア
        let mut topic_raw: Vec<Vec<f64>> =
            vec![Vec::with_capacity(candidates.len()); topic_groups.len()];

        for candidate in candidates {
            let answers = by_candidate
                .get(candidate.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let candidate_vector = builder.candidate_vector(answers);

            raw_scores.push(self.legacy_similarity(
                &user_vector,
                &candidate_vector,
                Some(weights.as_slice()),
            )?);

            for (group, scores) in topic_groups.iter().zip(topic_raw.iter_mut()) {
                // 設問のないトピックは全候補者 0（→ 絶対評価で下限）
                if group.indices.is_empty() {
                    scores.push(0.0);
                    continue;
                }
                let user_topic = project(&user_vector, &group.indices);
                let candidate_topic = project(&candidate_vector, &group.indices);
                scores.push(self.legacy_similarity(&user_topic, &candidate_topic, None)?);
            }
        }

        let band = &self.config().band;
        let percentages = band.normalize(&raw_scores);
        let topic_percentages: Vec<Vec<u8>> = topic_raw
            .iter()
            .map(|scores| band.normalize_topic(scores, self.config().topic_spread_threshold))
            .collect();

        let mut matches: Vec<CandidateMatch> = candidates
            .iter()
            .enumerate()
            .map(|(c, candidate)| {
                let mut topic_matches: Vec<TopicMatch> = topic_groups
                    .iter()
                    .zip(&topic_percentages)
                    .map(|(group, per_candidate)| TopicMatch {
                        topic_id: group.topic.id.clone(),
                        topic_name: group.topic.name.clone(),
                        match_percentage: per_candidate[c],
                    })
                    .collect();
                sort_by_percentage_desc(&mut topic_matches, |t| t.match_percentage);

                CandidateMatch {
                    candidate: candidate.clone(),
                    match_percentage: percentages[c],
                    topic_matches: Some(topic_matches),
                    raw_score: raw_scores[c],
                }
            })
            .collect();

        sort_by_percentage_desc(&mut matches, |m| m.match_percentage);
        debug!(
            ranked = matches.len(),
            topics = topic_groups.len(),
            top = ?matches.first().map(|m| m.match_percentage),
            "weighted legacy matches calculated"
        );
        Ok(matches)
    }

    fn legacy_similarity(
        &self,
        user: &[f64],
        candidate: &[f64],
        weights: Option<&[f64]>,
    ) -> Result<f64, MatchError> {
        match (self.config().legacy_metric, weights) {
            (LegacyMetric::Cosine, None) => cosine_similarity(user, candidate),
            (LegacyMetric::Cosine, Some(weights)) => {
                weighted_cosine_similarity(user, candidate, weights)
            }
            (LegacyMetric::ScaleDistance, weights) => {
                mean_scale_distance_similarity(user, candidate, weights)
            }
        }
    }
}

/// [`MatchEngine::calculate_matches`] with the default configuration.
pub fn calculate_matches(
    user_answers: &[UserAnswer],
    candidate_answers: &[CandidateAnswer],
    candidates: &[Candidate],
    questions: &[Question],
) -> Result<Vec<CandidateMatch>, MatchError> {
    MatchEngine::default().calculate_matches(user_answers, candidate_answers, candidates, questions)
}

/// [`MatchEngine::calculate_weighted_matches`] with the default configuration.
pub fn calculate_weighted_matches(
    user_answers: &[UserAnswer],
    user_topic_weights: &[UserTopicWeight],
    candidate_answers: &[CandidateAnswer],
    candidates: &[Candidate],
    questions: &[Question],
    topics: &[Topic],
) -> Result<Vec<CandidateMatch>, MatchError> {
    MatchEngine::default().calculate_weighted_matches(
        user_answers,
        user_topic_weights,
        candidate_answers,
        candidates,
        questions,
        topics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingConfig;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: id.into(),
            name: id.to_uppercase(),
            ..Candidate::default()
        }
    }

    fn question(id: &str, topic: &str) -> Question {
        Question {
            id: id.into(),
            topic: topic.into(),
            ..Question::default()
        }
    }

    fn topic(id: &str, name: &str) -> Topic {
        Topic {
            id: id.into(),
            name: name.into(),
            ..Topic::default()
        }
    }

    fn user(question: &str, value: f64) -> UserAnswer {
        UserAnswer {
            question_id: question.into(),
            value,
        }
    }

    fn answer(candidate: &str, question: &str, value: f64) -> CandidateAnswer {
        CandidateAnswer {
            candidate_id: candidate.into(),
            question_id: question.into(),
            value,
        }
    }

    fn ids<'a>(matches: &'a [CandidateMatch]) -> Vec<&'a str> {
        matches.iter().map(|m| m.candidate.id.as_str()).collect()
    }

    #[test]
    fn ranks_closer_candidate_first() {
        let questions = vec![question("q1", "economy"), question("q2", "economy")];
        let candidates = vec![candidate("far"), candidate("near")];
        let user_answers = vec![user("q1", 5.0), user("q2", 1.0)];
        let answers = vec![
            answer("far", "q1", 1.0),
            answer("far", "q2", 5.0),
            answer("near", "q1", 5.0),
            answer("near", "q2", 2.0),
        ];

        let matches = calculate_matches(&user_answers, &answers, &candidates, &questions).unwrap();

        assert_eq!(ids(&matches), vec!["near", "far"]);
        assert_eq!(matches[0].match_percentage, 100);
        assert_eq!(matches[1].match_percentage, 20);
        assert!(matches[0].raw_score > matches[1].raw_score);
        assert!(matches.iter().all(|m| m.topic_matches.is_none()));
    }

    #[test]
    fn single_collinear_question_ties_under_cosine() {
        let questions = vec![question("q1", "economy")];
        let candidates = vec![candidate("a"), candidate("b")];
        let answers = vec![answer("a", "q1", 5.0), answer("b", "q1", 1.0)];

        let matches =
            calculate_matches(&[user("q1", 5.0)], &answers, &candidates, &questions).unwrap();

        assert_eq!(ids(&matches), vec!["a", "b"]);
        assert_eq!(matches[0].match_percentage, 100);
        assert_eq!(matches[1].match_percentage, 100);
    }

    #[test]
    fn scale_distance_metric_separates_collinear_answers() {
        let engine = MatchEngine::new(MatchingConfig {
            legacy_metric: LegacyMetric::ScaleDistance,
            ..MatchingConfig::default()
        });
        let questions = vec![question("q1", "economy")];
        let candidates = vec![candidate("b"), candidate("a")];
        let answers = vec![answer("a", "q1", 5.0), answer("b", "q1", 1.0)];

        let matches = engine
            .calculate_matches(&[user("q1", 5.0)], &answers, &candidates, &questions)
            .unwrap();

        assert_eq!(ids(&matches), vec!["a", "b"]);
        assert!(matches[0].match_percentage > matches[1].match_percentage);
    }

    #[test]
    fn candidate_without_answers_scores_floor() {
        let questions = vec![question("q1", "economy")];
        let candidates = vec![candidate("silent"), candidate("talker")];
        let answers = vec![answer("talker", "q1", 4.0)];

        let matches =
            calculate_matches(&[user("q1", 4.0)], &answers, &candidates, &questions).unwrap();

        assert_eq!(ids(&matches), vec!["talker", "silent"]);
        assert_eq!(matches[1].raw_score, 0.0);
        assert_eq!(matches[1].match_percentage, 20);
    }

    #[test]
    fn empty_roster_yields_empty_result() {
        let questions = vec![question("q1", "economy")];
        let matches = calculate_matches(&[user("q1", 3.0)], &[], &[], &questions).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn weighted_matches_attach_sorted_topic_breakdown() {
        let questions = vec![
            question("q1", "economy"),
            question("q2", "economy"),
            question("q3", "health"),
        ];
        let topics = vec![
            topic("economy", "Economy"),
            topic("health", "Health"),
            topic("defense", "Defense"),
        ];
        let candidates = vec![candidate("a"), candidate("b")];
        let user_answers = vec![user("q1", 5.0), user("q2", 1.0), user("q3", 4.0)];
        let answers = vec![
            answer("a", "q1", 5.0),
            answer("a", "q2", 1.0),
            answer("a", "q3", 2.0),
            answer("b", "q1", 1.0),
            answer("b", "q2", 5.0),
            answer("b", "q3", 4.0),
        ];
        let weights = vec![UserTopicWeight {
            topic_id: "economy".into(),
            weight: 3.0,
        }];

        let matches = calculate_weighted_matches(
            &user_answers,
            &weights,
            &answers,
            &candidates,
            &questions,
            &topics,
        )
        .unwrap();

        assert_eq!(ids(&matches), vec!["a", "b"]);

        let a_topics = matches[0].topic_matches.as_ref().unwrap();
        assert_eq!(a_topics.len(), 3);
        assert_eq!(a_topics[0].topic_id, "economy");
        assert_eq!(a_topics[0].topic_name, "Economy");
        assert_eq!(a_topics[0].match_percentage, 100);
        // defense has no questions: raw 0 for everyone, absolute floor
        assert_eq!(a_topics[2].topic_id, "defense");
        assert_eq!(a_topics[2].match_percentage, 20);

        // health: both candidates answered positively, so cosine is 1 for both
        // (spread 0 → absolute mapping)
        let b_topics = matches[1].topic_matches.as_ref().unwrap();
        assert_eq!(b_topics[0].topic_id, "health");
        assert_eq!(b_topics[0].match_percentage, 100);
        assert_eq!(b_topics[1].topic_id, "economy");
        assert_eq!(b_topics[1].match_percentage, 20);
        assert_eq!(b_topics[2].topic_id, "defense");
        assert_eq!(b_topics[2].match_percentage, 20);
    }

    #[test]
    fn catalog_topic_without_questions_reports_floor() {
        let questions = vec![question("q1", "economy")];
        let topics = vec![topic("economy", "Economy"), topic("defense", "Defense")];
        let candidates = vec![candidate("a")];
        let answers = vec![answer("a", "q1", 4.0)];

        let matches = calculate_weighted_matches(
            &[user("q1", 4.0)],
            &[],
            &answers,
            &candidates,
            &questions,
            &topics,
        )
        .unwrap();

        let breakdown: Vec<(&str, u8)> = matches[0]
            .topic_matches
            .as_ref()
            .unwrap()
            .iter()
            .map(|t| (t.topic_id.as_str(), t.match_percentage))
            .collect();
        assert_eq!(breakdown, vec![("economy", 100), ("defense", 20)]);
    }

    #[test]
    fn topic_weight_shifts_overall_ranking() {
        let questions = vec![question("q1", "economy"), question("q2", "health")];
        let topics = vec![topic("economy", "Economy"), topic("health", "Health")];
        let candidates = vec![candidate("econ"), candidate("care")];
        let user_answers = vec![user("q1", 5.0), user("q2", 5.0)];
        let answers = vec![
            answer("econ", "q1", 5.0),
            answer("econ", "q2", 1.0),
            answer("care", "q1", 1.0),
            answer("care", "q2", 5.0),
        ];

        let rank = |topic_id: &str| {
            let weights = vec![UserTopicWeight {
                topic_id: topic_id.into(),
                weight: 5.0,
            }];
            let matches = calculate_weighted_matches(
                &user_answers,
                &weights,
                &answers,
                &candidates,
                &questions,
                &topics,
            )
            .unwrap();
            matches[0].candidate.id.clone()
        };

        assert_eq!(rank("economy"), "econ");
        assert_eq!(rank("health"), "care");
    }

    #[test]
    fn topic_questions_missing_from_catalog_do_not_error() {
        let questions = vec![question("q1", "orphan")];
        let topics = vec![topic("economy", "Economy")];
        let candidates = vec![candidate("a")];
        let answers = vec![answer("a", "q1", 3.0)];

        let matches = calculate_weighted_matches(
            &[user("q1", 3.0)],
            &[],
            &answers,
            &candidates,
            &questions,
            &topics,
        )
        .unwrap();

        assert_eq!(matches[0].match_percentage, 100);
        let topic_matches = matches[0].topic_matches.as_ref().unwrap();
        assert_eq!(topic_matches.len(), 1);
        assert_eq!(topic_matches[0].topic_id, "economy");
        assert_eq!(topic_matches[0].match_percentage, 20);
    }
}
