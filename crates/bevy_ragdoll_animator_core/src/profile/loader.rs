use bevy::asset::{AssetLoader, LoadContext, io::Reader};
use bevy::reflect::TypePath;
use uuid::Uuid;

use crate::{
    errors::{AssetLoaderError, RagdollError},
    profile::RagdollAnimationProfile,
};

#[derive(Default, TypePath)]
pub struct RagdollAnimationProfileLoader;

impl AssetLoader for RagdollAnimationProfileLoader {
    type Asset = RagdollAnimationProfile;
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
        let mut profile: RagdollAnimationProfile = ron::de::from_bytes(&bytes)?;
        validate(&profile)?;

        profile.version = Uuid::new_v4();
        Ok(profile)
    }

    fn extensions(&self) -> &[&str] {
        &["ranim.ron"]
    }
}

fn validate(profile: &RagdollAnimationProfile) -> Result<(), RagdollError> {
    check_unit("global_position_alpha", profile.global_position_alpha)?;
    check_unit(
        "global_position_damping_ratio",
        profile.global_position_damping_ratio,
    )?;
    check_unit("global_rotation_alpha", profile.global_rotation_alpha)?;
    check_unit(
        "global_rotation_damping_ratio",
        profile.global_rotation_damping_ratio,
    )?;
    check_non_negative(
        "global_max_linear_acceleration",
        profile.global_max_linear_acceleration,
    )?;
    check_non_negative(
        "global_max_angular_acceleration",
        profile.global_max_angular_acceleration,
    )?;

    for bone_override in profile
        .position_overrides
        .iter()
        .chain(&profile.rotation_overrides)
    {
        check_unit("override alpha", bone_override.alpha)?;
        check_unit("override damping_ratio", bone_override.damping_ratio)?;
    }

    Ok(())
}

fn check_unit(parameter: &'static str, value: f32) -> Result<(), RagdollError> {
    if (0. ..=1.).contains(&value) {
        Ok(())
    } else {
        Err(RagdollError::ParameterOutOfRange { parameter, value })
    }
}

fn check_non_negative(parameter: &'static str, value: f32) -> Result<(), RagdollError> {
    if value >= 0. {
        Ok(())
    } else {
        Err(RagdollError::ParameterOutOfRange { parameter, value })
    }
}
