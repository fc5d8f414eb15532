//! Error types for OpenMAT

use thiserror::Error;

/// OpenMAT error type
#[derive(Error, Debug)]
pub enum AgeingError {
    /// Background worker could not be spawned
    #[error("failed to spawn ageing worker: {0}")]
    SpawnFailed(String),
}

/// Result type for OpenMAT
pub type AgeingResult<T> = Result<T, AgeingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AgeingError::SpawnFailed("no threads left".into());
        assert_eq!(
            err.to_string(),
            "failed to spawn ageing worker: no threads left"
        );
    }
}
