use bevy::asset::{AssetLoader, LoadContext, io::Reader};
use bevy::reflect::TypePath;

use crate::{definition::RagdollDefinition, errors::AssetLoaderError};

#[derive(Default, TypePath)]
pub struct RagdollDefinitionLoader;

impl AssetLoader for RagdollDefinitionLoader {
    type Asset = RagdollDefinition;
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
        let definition: RagdollDefinition = ron::de::from_bytes(&bytes)?;
        definition.validate()?;

        Ok(definition)
    }

    fn extensions(&self) -> &[&str] {
        &["rdef.ron"]
    }
}
