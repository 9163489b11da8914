use thiserror::Error;

/// Errors surfaced by the scoring engine.
///
/// `LengthMismatch` is a contract violation: the caller built vectors that do
/// not line up with the question catalog. Data gaps (missing answers, weights,
/// topics) never produce an error.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("vector length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("failed to decode quiz data: {0}")]
    Decode(#[from] serde_json::Error),
}

impl MatchError {
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, MatchError::LengthMismatch { .. })
    }
}
