use crate::model::{Id, ValidationError};

/// Reasons a BOM sync can fail. Anything past validation rolls back the
/// whole transaction.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("make method not found: {0}")]
    MakeMethodNotFound(Id),

    #[error("item not found: {0}")]
    ItemNotFound(Id),

    #[error("item {readable_id} revision {revision} was not created")]
    ItemCreation { readable_id: String, revision: String },

    #[error("{0:#}")]
    Store(#[from] anyhow::Error),
}

impl SyncError {
    /// Stable machine readable name of the error variant
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "validation",
            SyncError::MakeMethodNotFound(_) => "make_method_not_found",
            SyncError::ItemNotFound(_) => "item_not_found",
            SyncError::ItemCreation { .. } => "item_creation",
            SyncError::Store(_) => "store",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}
