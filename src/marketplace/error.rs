use thiserror::Error;

/// Domain error taxonomy for marketplace operations.
///
/// `kind()` is the stable machine-checkable discriminator; the display
/// message is for humans and may change.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("{0}")]
    Validation(String),

    #[error("Not allowed")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl MarketplaceError {
    pub fn kind(&self) -> &'static str {
        match self {
            MarketplaceError::Validation(_) => "validation_error",
            MarketplaceError::Unauthorized => "unauthorized",
            MarketplaceError::NotFound(_) => "not_found",
            MarketplaceError::Conflict(_) => "conflict",
            MarketplaceError::Store(_) => "store_failure",
        }
    }
}
