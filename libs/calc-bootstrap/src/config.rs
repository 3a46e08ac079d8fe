//! Layered configuration loading.
//!
//! Every binary resolves its typed config the same way:
//! 1. compiled-in defaults (`T::default()`)
//! 2. YAML file passed with `--config`
//! 3. environment variables `<PREFIX>__SECTION__KEY`
//!
//! CLI overrides are applied by the binary on the returned value.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Configuration error for layered loading.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    #[error("failed to render configuration: {0}")]
    Render(String),
}

/// Load `T` from defaults, an optional YAML file and `env_prefix`-ed variables.
///
/// `env_prefix` is the variable name prefix without the trailing separator,
/// e.g. `"CALCULATOR_GATEWAY"` reads `CALCULATOR_GATEWAY__UPSTREAM__URI` into
/// `upstream.uri`.
///
/// # Errors
/// Returns [`ConfigError::FileNotFound`] for a missing file and
/// [`ConfigError::Invalid`] when the merged layers do not deserialize.
pub fn load_layered<T>(defaults: &T, file: Option<&Path>, env_prefix: &str) -> Result<T, ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    let mut figment = Figment::from(Serialized::defaults(defaults));

    if let Some(path) = file {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        figment = figment.merge(Yaml::file(path));
    }

    let env_prefix = format!("{env_prefix}__");
    figment = figment.merge(Env::prefixed(&env_prefix).split("__"));

    figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
}

/// Render a config value as YAML for `--print-config`.
///
/// # Errors
/// Returns [`ConfigError::Render`] if serialization fails.
pub fn to_yaml<T: Serialize>(value: &T) -> Result<String, ConfigError> {
    serde_saphyr::to_string(value).map_err(|e| ConfigError::Render(e.to_string()))
}
