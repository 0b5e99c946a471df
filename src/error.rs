use thiserror::Error;

/// Failure taxonomy for one generate/refine request. Every variant is
/// terminal for the request that produced it; the session keeps whatever
/// diagram was rendered before.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote completion call failed (transport, HTTP status, or an
    /// empty response body).
    #[error("completion request failed: {0}")]
    Completion(String),

    /// The model output contained no brace-delimited span at all.
    #[error("model output contained no JSON object")]
    Extraction,

    /// The extracted span was not valid JSON (strict and lenient parse
    /// both failed).
    #[error("model output was not valid JSON: {0}")]
    Parse(String),

    /// The parsed JSON violated a renderer invariant: wrong schema for the
    /// selected diagram type, an edge referencing an unknown node, or an
    /// activity diagram with no edges.
    #[error("cannot render diagram: {0}")]
    Render(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Chat-bubble text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Error::Completion(_) | Error::Extraction => {
                "Couldn't generate diagram. Please try again.".to_string()
            }
            Error::Parse(_) => {
                "Failed to parse diagram structure. Please try rephrasing.".to_string()
            }
            Error::Render(detail) => format!("Couldn't render the diagram: {detail}"),
            other => other.to_string(),
        }
    }
}
