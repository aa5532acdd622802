//! Error types for ffscribe-probe

/// Errors raised while walking a diagnostic text buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The label to extract does not occur in the buffer.
    ///
    /// Callers are expected to guard with [`crate::contains`] first; the
    /// metadata parser treats this as the end of a repeat group.
    #[error("label not found: {label:?}")]
    LabelNotFound {
        /// The label that was looked up.
        label: String,
    },
}

impl ParseError {
    /// Create a label not found error.
    pub fn label_not_found(label: impl Into<String>) -> Self {
        Self::LabelNotFound {
            label: label.into(),
        }
    }
}

/// Result type alias using [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;
