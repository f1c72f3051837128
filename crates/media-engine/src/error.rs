use thiserror::Error;
use voxlibre_generation::GenerationError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Speech synthesis failed
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid volume: {0} (expected 0-100)")]
    InvalidVolume(u8),

    #[error("Invalid position: {0}% (expected 0 to below 100)")]
    InvalidPosition(f64),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(EngineError::InvalidVolume(150).to_string().contains("150"));
        assert_eq!(
            EngineError::DecodeError("odd length".to_string()).to_string(),
            "Decode error: odd length"
        );
    }

    #[test]
    fn test_generation_error_converts() {
        let err: EngineError = GenerationError::MissingAudio.into();
        assert!(matches!(err, EngineError::Generation(_)));
    }
}
