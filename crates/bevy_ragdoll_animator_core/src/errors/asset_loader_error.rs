use thiserror::Error;

use crate::errors::RagdollError;

/// Possible errors that can be produced by the RON asset loaders.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AssetLoaderError {
    #[error("could not read asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse RON: {0}")]
    RonSpannedError(#[from] ron::error::SpannedError),
    #[error("asset does not satisfy constraints: {0}")]
    InvalidAsset(#[from] RagdollError),
}
