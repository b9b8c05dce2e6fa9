//! Immutable profile registry built once at startup.

use crate::config::Config;
use crate::error::ProxyError;
use crate::reasoning::ReasoningConfig;
use axum::http::{HeaderName, HeaderValue};
use std::collections::HashMap;

/// Path segment that always resolves to the default profile.
pub const DEFAULT_ALIAS: &str = "default";

/// One resolved upstream target.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub display_name: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Static headers in declaration order.
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub force_model: Option<String>,
    pub model_map: HashMap<String, String>,
    pub reasoning: Option<ReasoningConfig>,
}

impl Profile {
    /// A bare profile with no headers, model rules, or reasoning policy.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            base_url: base_url.into(),
            api_key: None,
            headers: Vec::new(),
            force_model: None,
            model_map: HashMap::new(),
            reasoning: None,
        }
    }

    /// The credential for this profile, or a configuration error naming it.
    pub fn credential(&self) -> Result<&str, ProxyError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ProxyError::Config {
                profile: self.name.clone(),
                field: "api_key",
            }),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_ok()
    }

    fn from_entry(name: &str, entry: &crate::config::ProfileEntry) -> Result<Self, anyhow::Error> {
        let mut headers = Vec::with_capacity(entry.headers.len());
        for (key, value) in entry.headers.iter() {
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| anyhow::anyhow!("profile '{name}': invalid header name '{key}': {e}"))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                anyhow::anyhow!("profile '{name}': invalid value for header '{key}': {e}")
            })?;
            headers.push((header_name, header_value));
        }

        Ok(Self {
            name: name.to_string(),
            display_name: entry.name.clone().unwrap_or_else(|| name.to_string()),
            base_url: entry.base_url.clone(),
            api_key: entry.api_key.clone(),
            headers,
            force_model: entry.force_model.clone(),
            model_map: entry
                .model_map
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            reasoning: entry.reasoning.clone(),
        })
    }
}

/// Name → profile lookup. Never mutated after construction.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: Vec<Profile>,
    index: HashMap<String, usize>,
    default_profile: Option<String>,
}

impl ProfileRegistry {
    /// Build a registry from profiles in declaration order.
    /// Fails on duplicate names or a default naming no profile.
    pub fn new(profiles: Vec<Profile>, default_profile: Option<&str>) -> Result<Self, anyhow::Error> {
        let mut index = HashMap::with_capacity(profiles.len());
        for (i, profile) in profiles.iter().enumerate() {
            if index.insert(profile.name.clone(), i).is_some() {
                anyhow::bail!("duplicate profile name '{}'", profile.name);
            }
        }
        if let Some(default) = default_profile {
            anyhow::ensure!(
                index.contains_key(default),
                "default profile '{default}' is not configured"
            );
        }
        Ok(Self {
            profiles,
            index,
            default_profile: default_profile.map(str::to_string),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let profiles = config
            .profiles
            .iter()
            .map(|(name, entry)| Profile::from_entry(name, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(profiles, config.default_profile_name())
    }

    /// Look up a profile by route segment. The `default` alias resolves to the
    /// default profile unless a profile is literally named `default`.
    pub fn resolve(&self, name: &str) -> Result<&Profile, ProxyError> {
        if let Some(&i) = self.index.get(name) {
            return Ok(&self.profiles[i]);
        }
        if name == DEFAULT_ALIAS
            && let Some(profile) = self.default_profile()
        {
            return Ok(profile);
        }
        Err(ProxyError::ProfileNotFound {
            profile: name.to_string(),
            available: self.names(),
        })
    }

    pub fn default_profile(&self) -> Option<&Profile> {
        self.default_profile
            .as_deref()
            .and_then(|name| self.index.get(name))
            .map(|&i| &self.profiles[i])
    }

    /// Profiles in configuration order.
    pub fn list(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
