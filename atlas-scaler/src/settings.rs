use crate::error::ConfigError;
use std::env;
use std::fs;

pub const DEFAULT_KEY_FILE: &str = "/run/secrets/atlas_key";

/// How `ATLAS_USER`/`ATLAS_KEY` are presented to Atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// Programmatic API key: public key and private key, HTTP digest.
    Digest,
    /// Service account: client id and secret, OAuth client credentials.
    ServiceAccount,
}

impl AuthMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "digest" | "api-key" => Some(AuthMode::Digest),
            "service-account" => Some(AuthMode::ServiceAccount),
            _ => None,
        }
    }
}

/// Runtime configuration, read from the environment (and `.env` via dotenv).
///
/// Missing credentials default to empty strings; `validate` turns that into a
/// configuration error before any API call is made.
#[derive(Clone, Debug)]
pub struct Settings {
    pub provider: String,
    pub base_url: String,
    /// Raw `ATLAS_AUTH` value; see [`Settings::auth_mode`].
    pub auth: String,
    pub user: String,
    pub key: String,
    pub group: String,
    pub mock_clusters_file: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        // Prefer *_FILE for secrets (Docker/K8s friendly), fallback to env var.
        let key_file = lookup("ATLAS_KEY_FILE").unwrap_or_else(|| DEFAULT_KEY_FILE.to_string());
        let key = fs::read_to_string(&key_file)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| get("ATLAS_KEY"));

        let provider = Some(get("ATLAS_PROVIDER"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "atlas".to_string());
        let base_url = Some(get("ATLAS_BASE_URL"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "https://cloud.mongodb.com".to_string());

        Self {
            provider,
            base_url,
            auth: get("ATLAS_AUTH"),
            user: get("ATLAS_USER"),
            key,
            group: get("ATLAS_GROUP"),
            mock_clusters_file: Some(get("ATLAS_MOCK_CLUSTERS_FILE")).filter(|s| !s.is_empty()),
        }
    }

    pub fn auth_mode(&self) -> Result<AuthMode, ConfigError> {
        AuthMode::parse(&self.auth).ok_or_else(|| ConfigError::InvalidValue {
            var: "ATLAS_AUTH".to_string(),
            value: self.auth.clone(),
        })
    }

    /// Credentials and project id must all be present to talk to Atlas.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth_mode()?;
        for (var, value) in [
            ("ATLAS_USER", &self.user),
            ("ATLAS_KEY", &self.key),
            ("ATLAS_GROUP", &self.group),
        ] {
            if value.is_empty() {
                return Err(ConfigError::MissingRequired {
                    var: var.to_string(),
                });
            }
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ConfigError::InvalidValue {
                var: "ATLAS_BASE_URL".to_string(),
                value: self.base_url.clone(),
            });
        }
        Ok(())
    }
}
