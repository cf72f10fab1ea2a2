/// Convenience result type used across backdrop.
pub type BackdropResult<T> = Result<T, BackdropError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Skip conditions (empty layers, missing producer content) are never errors; they are
/// handled in place and logged at `trace` level.
#[derive(thiserror::Error, Debug)]
pub enum BackdropError {
    /// Invalid user-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// The producer/consumer graph is misconfigured (e.g. a cycle at composition time).
    /// Callers must not continue drawing the affected frame.
    #[error("area graph error: {0}")]
    Graph(String),

    /// An operation addressed an effect or area that is not attached.
    #[error("detached: {0}")]
    Detached(String),

    /// Errors raised by a layer recorder while recording or playing back.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BackdropError {
    /// Build a [`BackdropError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BackdropError::Graph`] value.
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph(msg.into())
    }

    /// Build a [`BackdropError::Detached`] value.
    pub fn detached(msg: impl Into<String>) -> Self {
        Self::Detached(msg.into())
    }

    /// Build a [`BackdropError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`BackdropError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether the error describes a misconfigured graph that cannot be drawn safely.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Graph(_) | Self::Detached(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
