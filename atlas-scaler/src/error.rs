use thiserror::Error;

/// Problems detected before any API call is made.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {var}")]
    MissingRequired { var: String },

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("Unsupported cluster provider: {0}")]
    UnsupportedProvider(String),
}

#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("a minimum TLS protocol version is required to change TLS settings")]
    MissingTlsVersion,

    #[error("listing clusters failed")]
    Listing(#[source] anyhow::Error),
}
