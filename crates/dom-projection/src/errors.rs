use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("malformed DOMSnapshot.captureSnapshot response: {0}")]
    MalformedSnapshot(String),
    #[error("malformed Accessibility.getFullAXTree response: {0}")]
    MalformedAxTree(String),
    #[error("malformed DOM.getDocument response: {0}")]
    MalformedDomTree(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProjectionError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
