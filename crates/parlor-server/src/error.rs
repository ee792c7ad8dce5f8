use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: set {env_var}")]
    MissingEnvVar { env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Map a dotted settings field (`platform.api_key`) to the environment
/// variable a deployer has to set (`PARLOR_PLATFORM__API_KEY`).
pub fn to_env_var(field: &str) -> String {
    format!("PARLOR_{}", field.replace('.', "__").to_uppercase())
}
