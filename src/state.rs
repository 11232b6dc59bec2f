use crate::{
    config::{AppConfig, RouterVariant},
    identity::IdentityProvider,
    services::{images::ImageStore, model::CameraModel},
};

/// Shared, immutable handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub model: CameraModel,
    pub images: ImageStore,
    pub identity: IdentityProvider,
    pub variant: RouterVariant,
}

impl AppState {
    /// Compose the state for `variant`; the basic variant drops identity and upload.
    pub fn new(
        model: CameraModel,
        images: ImageStore,
        identity: IdentityProvider,
        variant: RouterVariant,
    ) -> Self {
        Self {
            model,
            images: if variant.has_upload() {
                images
            } else {
                ImageStore::Disabled
            },
            identity: if variant.has_auth() {
                identity
            } else {
                IdentityProvider::Disabled
            },
            variant,
        }
    }

    /// Build image store and identity provider from configuration.
    pub fn from_config(model: CameraModel, cfg: &AppConfig) -> anyhow::Result<Self> {
        let images = ImageStore::local(&cfg.image_dir, &cfg.image_base_url);
        let identity =
            IdentityProvider::trusted_headers(&cfg.auth_id_header, &cfg.auth_name_header)?;
        Ok(Self::new(model, images, identity, cfg.router))
    }
}
