pub mod config;
pub mod error;
pub mod logging;
pub mod matching;
pub mod model;

pub use config::{LegacyMetric, MatchingConfig};
pub use error::MatchError;
pub use matching::{
    CandidateMatch, MatchEngine, SvoCandidateMatch, TopicMatch, calculate_matches,
    calculate_svo_matches, calculate_weighted_matches, calculate_weighted_svo_matches,
};
pub use model::{
    AnswerValue, Candidate, CandidateAnswer, CandidateAnswerSvo, Priority, Question,
    QuestionSvo, QuestionType, QuizData, QuizDataSvo, Scope, Topic, TopicImportance, UserAnswer,
    UserAnswerSvo, UserTopicWeight,
};
