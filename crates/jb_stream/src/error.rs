use thiserror::Error;

// -----------------------------------------------------------------------------
// StreamError

/// Failures raised by sources, sinks and their factories.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StreamError {
    #[error("I/O failure while streaming JSON: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("unexpected end of JSON input")]
    UnexpectedEnd,

    #[error("event `{event}` is not allowed here (depth {depth})")]
    Unbalanced { event: &'static str, depth: usize },

    #[error("invalid stream configuration: {0}")]
    Configuration(String),
}
