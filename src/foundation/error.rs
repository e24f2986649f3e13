/// Convenience result type used across BitmapForge.
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ForgeError {
    /// Invalid caller-provided data (sizes, frame counts, sink configuration).
    #[error("validation error: {0}")]
    Validation(String),

    /// The model file extension has no registered parser.
    #[error("unsupported model format: .{extension}")]
    UnsupportedFormat {
        /// Lower-cased extension without the leading dot.
        extension: String,
    },

    /// A model parser rejected its input.
    #[error("parse error: {0}")]
    Parse(String),

    /// Any failure while loading a model, tagged with the file name.
    #[error("failed to load model {name}: {source}")]
    ModelLoad {
        /// File name as given by the caller.
        name: String,
        /// Underlying failure.
        source: Box<ForgeError>,
    },

    /// The render backend lost its drawing context.
    #[error("render context lost")]
    ContextLost,

    /// The facade was used after `dispose()`.
    #[error("scene manager used after dispose: {0}")]
    Disposed(String),

    /// An export was cancelled through its [`CancelToken`](crate::CancelToken).
    #[error("export cancelled")]
    Cancelled,

    /// Errors raised by frame sinks / encoders.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing settings.
    #[error("serialization error: {0}")]
    Serde(String),

    /// IO failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgeError {
    /// Build a [`ForgeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ForgeError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`ForgeError::Disposed`] value.
    pub fn disposed(msg: impl Into<String>) -> Self {
        Self::Disposed(msg.into())
    }

    /// Build a [`ForgeError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ForgeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Wrap `self` as a load failure for `name`.
    pub fn into_model_load(self, name: impl Into<String>) -> Self {
        Self::ModelLoad {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// `true` when the error is a backend context loss.
    pub fn is_context_lost(&self) -> bool {
        matches!(self, Self::ContextLost)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
