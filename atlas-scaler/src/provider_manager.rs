use crate::error::ConfigError;
use crate::settings::Settings;
use anyhow::Result;
use atlas_providers::ClusterManager;

pub struct ProviderManager;

impl ProviderManager {
    /// Build the provider named by `ATLAS_PROVIDER`. Fails before any network
    /// traffic when the provider is unknown or its configuration is incomplete.
    pub fn get_provider(settings: &Settings) -> Result<Box<dyn ClusterManager>> {
        match settings.provider.to_lowercase().as_str() {
            #[cfg(feature = "provider-atlas")]
            "atlas" => {
                use crate::settings::AuthMode;
                use atlas_providers::atlas::{AtlasProvider, Credentials};

                settings.validate()?;
                let credentials = match settings.auth_mode()? {
                    AuthMode::Digest => Credentials::ApiKey {
                        public_key: settings.user.clone(),
                        private_key: settings.key.clone(),
                    },
                    AuthMode::ServiceAccount => Credentials::ServiceAccount {
                        client_id: settings.user.clone(),
                        client_secret: settings.key.clone(),
                    },
                };
                let provider =
                    AtlasProvider::new(&settings.base_url, settings.group.clone(), credentials)?;
                Ok(Box::new(provider))
            }
            #[cfg(feature = "provider-mock")]
            "mock" => {
                let clusters = match &settings.mock_clusters_file {
                    Some(path) => {
                        let raw = std::fs::read_to_string(path)?;
                        serde_json::from_str(&raw)?
                    }
                    None => Vec::new(),
                };
                Ok(Box::new(atlas_providers::mock::MockProvider::new(clusters)))
            }
            // Add other providers here.
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}
