pub mod answer;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod similarity;
pub mod svo;
pub mod topics;
pub mod vector;
pub mod weights;

pub use normalize::{
    AbsoluteCurve, ScoreBand, absolute_percentage, normalize_scores, power_curve_percentage,
};
pub use pipeline::{CandidateMatch, MatchEngine, SvoCandidateMatch, TopicMatch};
pub use scoring::{calculate_matches, calculate_weighted_matches};
pub use similarity::{
    cosine_similarity, exact_match_similarity, scale_distance_similarity, set_similarity,
    similarity_for_question, weighted_cosine_similarity,
};
pub use svo::{calculate_svo_matches, calculate_weighted_svo_matches};
