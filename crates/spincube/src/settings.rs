use std::fs;
use std::path::{Path, PathBuf};

use renderer::Antialiasing;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::cli::{parse_antialias, parse_surface_size};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Optional TOML settings mirroring the CLI flags.
///
/// Unknown keys are rejected so a typo fails loudly instead of being
/// silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Texture path or http(s) URL.
    pub texture: Option<String>,
    /// Window size as `WIDTHxHEIGHT`.
    #[serde(default, deserialize_with = "deserialize_size_opt")]
    pub size: Option<(u32, u32)>,
    /// `auto`, `off`, or an MSAA sample count (string or integer).
    #[serde(default, deserialize_with = "deserialize_antialias_opt")]
    pub antialias: Option<Antialiasing>,
    /// Window title.
    pub title: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

fn deserialize_size_opt<'de, D>(deserializer: D) -> Result<Option<(u32, u32)>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| parse_surface_size(&value).map_err(de::Error::custom))
        .transpose()
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<Antialiasing>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    match helper {
        None => Ok(None),
        Some(Helper::Str(raw)) => parse_antialias(&raw).map(Some).map_err(de::Error::custom),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            parse_antialias(&value.to_string())
                .map(Some)
                .map_err(de::Error::custom)
        }
    }
}
