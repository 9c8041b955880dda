//! Configuration file, named profiles and local labels.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::paths::APP_DIR;
use crate::types::LabelMap;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Hard cap on search results.
pub const MAX_SEARCH_LIMIT: usize = 500;

/// Default (and maximum) page size when paging the camera inventory.
pub const DEFAULT_PAGE_SIZE: u32 = 200;
pub const MAX_PAGE_SIZE: u32 = 200;

/// Default HTTP timeout for inventory requests, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default API base URL written by `config init`.
pub const DEFAULT_BASE_URL: &str = "https://api.verkada.com";

/// Name of the implicit profile.
pub const DEFAULT_PROFILE: &str = "default";

pub const ENV_PROFILE: &str = "CAMDEX_PROFILE";
pub const ENV_BASE_URL: &str = "CAMDEX_BASE_URL";
pub const ENV_ORG_ID: &str = "CAMDEX_ORG_ID";
pub const ENV_API_KEY: &str = "CAMDEX_API_KEY";
pub const ENV_TOKEN: &str = "CAMDEX_TOKEN";

/// On-disk configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Profile used when none is selected explicitly.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_profile: String,

    /// Named profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// Connection settings and labels for one API tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// API base URL.
    #[serde(default)]
    pub base_url: String,

    /// Organization ID.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub org_id: String,

    /// Credentials.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Extra headers sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Local camera labels (camera_id -> label).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: LabelMap,
}

/// API credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Sent as `x-api-key`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Sent as `x-verkada-auth`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}

/// Values that take precedence over the config file, usually from flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub base_url: Option<String>,
    pub org_id: Option<String>,
    pub api_key: Option<String>,
    pub token: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// Selected profile name.
    pub profile_name: String,

    /// Profile after environment and flag overrides.
    pub profile: Profile,

    /// Config file the profile came from.
    pub config_path: PathBuf,
}

/// Default config path: `<config_dir>/camdex/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Config path from an optional flag value.
pub fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    match flag {
        Some(path) => path.to_path_buf(),
        None => default_config_path(),
    }
}

/// First candidate that is present and non-blank.
fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

impl ConfigFile {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| IndexError::Config {
            message: format!("Failed to parse config {}: {}", path.display(), e),
        })?;
        config.normalize();
        Ok(config)
    }

    /// Load configuration, treating a missing file as empty.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(IndexError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Write configuration to file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut config = self.clone();
        config.normalize();
        let content = toml::to_string_pretty(&config).map_err(|e| IndexError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        debug!("Wrote config to {:?}", path);
        Ok(())
    }

    /// Pick a current profile when none is recorded.
    pub fn normalize(&mut self) {
        if !self.current_profile.trim().is_empty() || self.profiles.is_empty() {
            return;
        }
        self.current_profile = if self.profiles.contains_key(DEFAULT_PROFILE) {
            DEFAULT_PROFILE.to_string()
        } else {
            // BTreeMap iteration is ordered, so this choice is stable.
            self.profiles.keys().next().cloned().unwrap_or_default()
        };
    }

    /// Selected profile name: flag > env > `current_profile` > `"default"`.
    pub fn selected_profile_name(
        &self,
        flag: Option<&str>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> String {
        let env_profile = env(ENV_PROFILE);
        first_non_empty([
            flag,
            env_profile.as_deref(),
            Some(self.current_profile.as_str()),
        ])
        .unwrap_or(DEFAULT_PROFILE)
        .trim()
        .to_string()
    }

    /// Resolve the effective profile using the process environment.
    pub fn effective(&self, overrides: &Overrides, config_path: &Path) -> Result<EffectiveConfig> {
        self.effective_with_env(overrides, config_path, &|key: &str| std::env::var(key).ok())
    }

    /// Resolve the effective profile: file < environment < overrides.
    pub fn effective_with_env(
        &self,
        overrides: &Overrides,
        config_path: &Path,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<EffectiveConfig> {
        let profile_name = self.selected_profile_name(overrides.profile.as_deref(), env);
        let mut profile = self
            .profiles
            .get(&profile_name)
            .cloned()
            .ok_or_else(|| IndexError::ProfileNotFound {
                name: profile_name.clone(),
                path: config_path.to_path_buf(),
            })?;

        apply(&mut profile.base_url, env(ENV_BASE_URL), overrides.base_url.clone());
        apply(&mut profile.org_id, env(ENV_ORG_ID), overrides.org_id.clone());
        apply(&mut profile.auth.api_key, env(ENV_API_KEY), overrides.api_key.clone());
        apply(&mut profile.auth.token, env(ENV_TOKEN), overrides.token.clone());

        if profile.base_url.trim().is_empty() {
            return Err(IndexError::config(format!(
                "base URL is empty (set it in the config, {} or --base-url)",
                ENV_BASE_URL
            )));
        }

        Ok(EffectiveConfig {
            profile_name,
            profile,
            config_path: config_path.to_path_buf(),
        })
    }

    /// Mutable access to a named profile.
    pub fn profile_mut(&mut self, name: &str, config_path: &Path) -> Result<&mut Profile> {
        self.profiles
            .get_mut(name)
            .ok_or_else(|| IndexError::ProfileNotFound {
                name: name.to_string(),
                path: config_path.to_path_buf(),
            })
    }
}

fn apply(field: &mut String, env: Option<String>, flag: Option<String>) {
    for value in [env, flag].into_iter().flatten() {
        if !value.is_empty() {
            *field = value;
        }
    }
}

impl Profile {
    /// Profile seeded for `config init`.
    pub fn initial(env: &dyn Fn(&str) -> Option<String>) -> Self {
        let base_url = env(ENV_BASE_URL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            base_url,
            org_id: env(ENV_ORG_ID).unwrap_or_default(),
            auth: AuthConfig {
                api_key: env(ENV_API_KEY).unwrap_or_default(),
                token: env(ENV_TOKEN).unwrap_or_default(),
            },
            ..Self::default()
        }
    }

    /// Set a label, returning the trimmed value stored.
    pub fn set_label(&mut self, camera_id: &str, label: &str) -> Result<String> {
        let camera_id = camera_id.trim();
        let label = label.trim();
        if camera_id.is_empty() {
            return Err(IndexError::invalid_argument("camera_id is empty"));
        }
        if label.is_empty() {
            return Err(IndexError::invalid_argument("label is empty"));
        }
        self.labels.insert(camera_id.to_string(), label.to_string());
        Ok(label.to_string())
    }

    /// Remove a label; returns whether one existed.
    pub fn remove_label(&mut self, camera_id: &str) -> bool {
        self.labels.remove(camera_id.trim()).is_some()
    }
}
