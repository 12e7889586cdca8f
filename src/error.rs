//! Engine error type

use std::fmt;

/// Everything that can go wrong outside of a running shot.
///
/// Faults raised while a shot is executing never escape `fire()`; they are
/// recorded on the `ShotResult` instead.
#[derive(Debug)]
pub enum EngineError {
    /// Segment `type` string the engine doesn't know
    UnknownSegmentKind { index: usize, kind: String },
    /// Required numeric field absent from a segment spec
    MissingField { index: usize, field: &'static str },
    /// Numeric field present but unusable (NaN, negative, zero)
    InvalidField {
        index: usize,
        field: &'static str,
        value: f64,
    },
    /// Fire request with a non-finite origin or direction
    InvalidRequest(String),
    /// The obstacle query panicked mid-shot
    ObstacleQueryFailed(String),
    /// Executor built without an obstacle query
    MissingObstacleQuery,
    /// Engine configuration rejected by `EngineConfig::validate`
    InvalidConfig(String),
    /// Persisted envelope written by an incompatible version
    UnsupportedVersion { found: u32, expected: u32 },
    /// Transport refused a message
    Transport(String),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnknownSegmentKind { index, kind } => {
                write!(f, "segment {index}: unknown segment kind '{kind}'")
            }
            EngineError::MissingField { index, field } => {
                write!(f, "segment {index}: missing required field '{field}'")
            }
            EngineError::InvalidField {
                index,
                field,
                value,
            } => write!(f, "segment {index}: invalid value {value} for '{field}'"),
            EngineError::InvalidRequest(msg) => write!(f, "invalid fire request: {msg}"),
            EngineError::ObstacleQueryFailed(msg) => write!(f, "obstacle query failed: {msg}"),
            EngineError::MissingObstacleQuery => {
                write!(f, "executor requires an obstacle query service")
            }
            EngineError::InvalidConfig(msg) => write!(f, "invalid engine config: {msg}"),
            EngineError::UnsupportedVersion { found, expected } => {
                write!(f, "unsupported record version {found} (expected {expected})")
            }
            EngineError::Transport(msg) => write!(f, "transport error: {msg}"),
            EngineError::Json(e) => write!(f, "json error: {e}"),
            EngineError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Json(e) => Some(e),
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Json(e)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_segment() {
        let err = EngineError::UnknownSegmentKind {
            index: 2,
            kind: "spiral".to_string(),
        };
        assert_eq!(err.to_string(), "segment 2: unknown segment kind 'spiral'");
    }

    #[test]
    fn test_json_error_has_source() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = EngineError::from(json_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
