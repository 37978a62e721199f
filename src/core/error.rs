//! Error types for the landmark engine

use thiserror::Error;

use crate::placement::template::PlacementError;

/// Main error type for the engine.
///
/// Per-candidate rejections are not errors; see
/// [`Rejection`](crate::placement::candidate::Rejection).
#[derive(Debug, Error)]
pub enum Error {
    #[error("World not found: {0}")]
    WorldNotFound(String),

    #[error("Structure template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid structure template {id}: {reason}")]
    InvalidTemplate { id: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Structure placement failed at ({x}, {y}, {z}): {source}")]
    Placement {
        x: i32,
        y: i32,
        z: i32,
        #[source]
        source: PlacementError,
    },

    #[error("Placement record store error: {0}")]
    RecordStore(String),

    #[error("No candidate site could be scored after {rounds} rounds")]
    RoundsExhausted { rounds: u32 },

    #[error("Placement task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Configuration errors abort the attempt and are never retried automatically.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::WorldNotFound(_)
                | Error::TemplateNotFound(_)
                | Error::InvalidTemplate { .. }
                | Error::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::TemplateNotFound("tower".into()).is_configuration());
        assert!(Error::WorldNotFound("nether".into()).is_configuration());
        assert!(!Error::RoundsExhausted { rounds: 4 }.is_configuration());
        assert!(!Error::RecordStore("disk full".into()).is_configuration());
    }

    #[tokio::test]
    async fn test_aborted_search_task_converts() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        let err: Error = handle.await.unwrap_err().into();
        assert!(matches!(err, Error::Task(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_display_includes_position() {
        let err = Error::Placement {
            x: 1,
            y: 2,
            z: 3,
            source: PlacementError::OutOfBounds,
        };
        assert!(err.to_string().contains("(1, 2, 3)"));
    }
}
