use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use dilithium_signer_core::{Backend, SecurityLevel, SignerPaths};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Notes ref used when the config file does not name one.
pub const DEFAULT_NOTES_REF: &str = "signatures";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ConfigFormat {
    Auto,
    Toml,
    Yaml,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
pub enum BackendChoice {
    #[default]
    #[serde(rename = "pqclean")]
    #[value(name = "pqclean")]
    PqClean,
    #[serde(rename = "liboqs")]
    #[value(name = "liboqs")]
    LibOqs,
}

impl From<BackendChoice> for Backend {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::PqClean => Backend::PqClean,
            BackendChoice::LibOqs => Backend::LibOqs,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {format:?} config: {details}")]
    Parse {
        format: ConfigFormat,
        details: String,
    },
    #[error("configuration invalid: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub signer: SignerSection,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SignerSection {
    /// State directory; `~/.dilithium-signer` when unset.
    #[serde(default)]
    pub home: Option<PathBuf>,
    #[serde(default = "default_level", deserialize_with = "deserialize_level")]
    pub default_level: SecurityLevel,
    #[serde(default = "default_notes_ref")]
    pub notes_ref: String,
    #[serde(default)]
    pub backend: BackendChoice,
}

impl Default for SignerSection {
    fn default() -> Self {
        Self {
            home: None,
            default_level: default_level(),
            notes_ref: default_notes_ref(),
            backend: BackendChoice::default(),
        }
    }
}

const fn default_level() -> SecurityLevel {
    SecurityLevel::Level2
}

fn default_notes_ref() -> String {
    DEFAULT_NOTES_REF.to_owned()
}

/// Accepts `default-level = "3"` as well as a bare `3`.
fn deserialize_level<'de, D>(deserializer: D) -> Result<SecurityLevel, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LevelRepr {
        Tag(String),
        Number(u64),
    }

    let tag = match LevelRepr::deserialize(deserializer)? {
        LevelRepr::Tag(tag) => tag,
        LevelRepr::Number(number) => number.to_string(),
    };
    tag.parse().map_err(serde::de::Error::custom)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let notes_ref = self.signer.notes_ref.trim();
        if notes_ref.is_empty() {
            return Err(ConfigError::Validation("notes-ref must not be empty".into()));
        }
        if notes_ref.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "notes-ref cannot contain whitespace".into(),
            ));
        }
        Ok(())
    }

    /// Resolve signer state paths: explicit override, then config, then home.
    pub fn paths(&self, home_override: Option<&Path>) -> Result<SignerPaths, ConfigError> {
        if let Some(home) = home_override.or(self.signer.home.as_deref()) {
            return Ok(SignerPaths::from_root(home));
        }
        SignerPaths::default_home().ok_or_else(|| {
            ConfigError::Validation(
                "no home directory found; pass --home or set signer.home".into(),
            )
        })
    }
}

pub fn load_config(path: &Path, format: ConfigFormat) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents, resolve_format(path, format))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn parse_config(contents: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|err| ConfigError::Parse {
            format,
            details: err.to_string(),
        }),
        ConfigFormat::Toml | ConfigFormat::Auto => {
            toml::from_str(contents).map_err(|err| ConfigError::Parse {
                format: ConfigFormat::Toml,
                details: err.to_string(),
            })
        }
    }?;
    config.validate()?;
    Ok(config)
}

fn resolve_format(path: &Path, format: ConfigFormat) -> ConfigFormat {
    match format {
        ConfigFormat::Auto => match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        },
        _ => format,
    }
}
