mod asset_loader_error;
mod ragdoll_error;

pub use asset_loader_error::AssetLoaderError;
pub use ragdoll_error::RagdollError;
