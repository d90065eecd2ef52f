use bevy::asset::{AssetLoader, LoadContext, io::Reader};
use bevy::reflect::TypePath;

use crate::{errors::AssetLoaderError, power::RagdollPowerProfile};

#[derive(Default, TypePath)]
pub struct RagdollPowerProfileLoader;

impl AssetLoader for RagdollPowerProfileLoader {
    type Asset = RagdollPowerProfile;
    type Settings = ();
    type Error = AssetLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes).await?;
        Ok(ron::de::from_bytes(&bytes)?)
    }

    fn extensions(&self) -> &[&str] {
        &["rpow.ron"]
    }
}
