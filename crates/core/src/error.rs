use crate::paths::MediaFlavor;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Incomplete media, missing: {}", format_flavors(.missing))]
    IncompleteMedia { missing: Vec<MediaFlavor> },

    #[error("Invalid entity kind '{0}'. Must be one of: Shot, Asset, Sequence")]
    InvalidEntityKind(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    /// Shorthand for a lookup miss on `entity` identified by `key`.
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }
}

fn format_flavors(flavors: &[MediaFlavor]) -> String {
    flavors
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}
