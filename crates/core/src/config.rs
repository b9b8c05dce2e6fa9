use crate::reasoning::ReasoningConfig;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::LazyLock;

/// Written by `chub-relay init` (and by `run` when no config exists yet).
pub const STARTER_CONFIG: &str = r#"# chub-relay configuration
host: "127.0.0.1"
port: 8080
default_profile: openrouter

profiles:
  openrouter:
    name: "OpenRouter (All Models)"
    base_url: "https://openrouter.ai/api/v1"
    api_key: "${OPENROUTER_API_KEY}"
    headers:
      HTTP-Referer: "http://localhost:8080"
      X-Title: "Chub.ai Proxy"
    # Hybrid models default to non-reasoning mode; this switches reasoning on.
    reasoning:
      enabled: true
      effort: high
      exclude: false   # true hides reasoning from the output

  # deepseek-direct:
  #   name: "DeepSeek (direct)"
  #   base_url: "https://api.deepseek.com/v1"
  #   api_key: "${DEEPSEEK_API_KEY}"
  #   model_map:
  #     deepseek-v3.1: deepseek-chat
  #     deepseek-r1: deepseek-reasoner
  #
  # custom:
  #   name: "Custom endpoint"
  #   base_url: "http://localhost:11434/v1"
  #   api_key: "${CUSTOM_API_KEY}"
  #   force_model: "my-model"
"#;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

// ─── Config ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Profile used by the `/default` alias. Falls back to the first declared profile.
    pub default_profile: Option<String>,

    // Outbound proxy for upstream calls
    pub proxy_url: Option<String>,

    // Debug & logging
    pub verbose: bool,
    pub logging_to_file: bool,
    pub log_dir: Option<String>,

    // Timeouts (seconds)
    pub connect_timeout: u64,
    pub request_timeout: u64,

    // Request body size limit (MB)
    pub body_limit_mb: usize,

    pub profiles: OrderedMap<ProfileEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            default_profile: None,
            proxy_url: None,
            verbose: false,
            logging_to_file: false,
            log_dir: None,
            connect_timeout: 30,
            request_timeout: 300,
            body_limit_mb: 10,
            profiles: OrderedMap::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file, resolve `${VAR}` placeholders from the
    /// process environment, sanitize, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents, |var| std::env::var(var).ok())
    }

    /// Parse config text with an explicit environment lookup.
    pub fn from_yaml(
        contents: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, anyhow::Error> {
        let mut config: Config = serde_yaml_ng::from_str(contents)?;
        config.resolve_placeholders(lookup);
        config.sanitize();
        config.validate()?;
        Ok(config)
    }

    /// Write the starter config to `path` unless a file already exists there.
    /// Returns `true` when a file was written.
    pub fn write_starter(path: impl AsRef<Path>) -> Result<bool, anyhow::Error> {
        let path = path.as_ref();
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, STARTER_CONFIG)?;
        Ok(true)
    }

    /// Name of the profile served under the `/default` alias.
    pub fn default_profile_name(&self) -> Option<&str> {
        self.default_profile
            .as_deref()
            .or_else(|| self.profiles.keys().next())
    }

    fn resolve_placeholders(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (name, entry) in self.profiles.iter_mut() {
            if let Some(key) = entry.api_key.as_mut() {
                *key = substitute(key, &lookup, name);
            }
            entry.base_url = substitute(&entry.base_url, &lookup, name);
            for (_, value) in entry.headers.iter_mut() {
                *value = substitute(value, &lookup, name);
            }
        }
    }

    fn sanitize(&mut self) {
        for (_, entry) in self.profiles.iter_mut() {
            while entry.base_url.ends_with('/') {
                entry.base_url.pop();
            }
            if entry.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                entry.api_key = None;
            }
            if entry.force_model.as_deref().is_some_and(str::is_empty) {
                entry.force_model = None;
            }
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, entry) in self.profiles.iter() {
            anyhow::ensure!(!name.is_empty(), "profile names must not be empty");
            anyhow::ensure!(
                !name.contains('/'),
                "profile name '{name}' must not contain '/'"
            );
            url::Url::parse(&entry.base_url)
                .map_err(|e| anyhow::anyhow!("profile '{name}': invalid base_url: {e}"))?;
        }
        if let Some(ref default) = self.default_profile {
            anyhow::ensure!(
                self.profiles.get(default).is_some(),
                "default_profile '{default}' does not name a configured profile"
            );
        }
        if let Some(ref proxy) = self.proxy_url {
            crate::proxy::validate_proxy_url(proxy)?;
        }
        Ok(())
    }
}

/// Replace `${VAR}` placeholders. Unset variables resolve to an empty string.
fn substitute(value: &str, lookup: &impl Fn(&str) -> Option<String>, profile: &str) -> String {
    PLACEHOLDER
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let var = &caps[1];
            lookup(var).unwrap_or_else(|| {
                tracing::warn!(profile = %profile, var = %var, "environment variable not set");
                String::new()
            })
        })
        .into_owned()
}

// ─── Profile entry ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileEntry {
    /// Human-readable label, shown in the startup summary.
    pub name: Option<String>,
    pub base_url: String,
    pub api_key: Option<String>,
    pub headers: OrderedMap<String>,
    pub force_model: Option<String>,
    pub model_map: OrderedMap<String>,
    pub reasoning: Option<ReasoningConfig>,
}

// ─── Ordered map ───────────────────────────────────────────────────────────

/// String-keyed map that keeps declaration order and rejects duplicate keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut V)> {
        self.0.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping with unique string keys")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(OrderedMap::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(serde::de::Error::custom(format!("duplicate key `{key}`")));
                    }
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::Effort;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.connect_timeout, 30);
        assert_eq!(cfg.request_timeout, 300);
        assert_eq!(cfg.body_limit_mb, 10);
        assert!(!cfg.verbose);
        assert!(cfg.profiles.is_empty());
        assert!(cfg.default_profile_name().is_none());
    }

    #[test]
    fn test_yaml_deserialization() {
        let yaml = r#"
port: 9000
default_profile: custom
profiles:
  openrouter:
    name: "OpenRouter"
    base_url: "https://openrouter.ai/api/v1/"
    api_key: "sk-or-test"
    headers:
      X-Title: "Chub"
      HTTP-Referer: "http://localhost"
    reasoning:
      enabled: true
      effort: high
  custom:
    base_url: "http://localhost:1234/v1"
    api_key: "k"
    force_model: "my-model"
    model_map:
      gpt-5: gpt-4o
"#;
        let config = Config::from_yaml(yaml, no_env).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.default_profile_name(), Some("custom"));
        assert_eq!(
            config.profiles.keys().collect::<Vec<_>>(),
            vec!["openrouter", "custom"]
        );

        let or = config.profiles.get("openrouter").unwrap();
        assert_eq!(or.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(
            or.headers.keys().collect::<Vec<_>>(),
            vec!["X-Title", "HTTP-Referer"]
        );
        let reasoning = or.reasoning.as_ref().unwrap();
        assert!(reasoning.enabled);
        assert_eq!(reasoning.effort, Some(Effort::High));
        assert_eq!(reasoning.exclude, None);

        let custom = config.profiles.get("custom").unwrap();
        assert_eq!(custom.force_model.as_deref(), Some("my-model"));
        assert_eq!(custom.model_map.get("gpt-5").map(String::as_str), Some("gpt-4o"));
    }

    #[test]
    fn test_duplicate_profile_names_rejected() {
        let yaml = r#"
profiles:
  dup:
    base_url: "https://a.example.com"
  dup:
    base_url: "https://b.example.com"
"#;
        assert!(Config::from_yaml(yaml, no_env).is_err());
    }

    #[test]
    fn test_unknown_default_profile_rejected() {
        let yaml = r#"
default_profile: missing
profiles:
  present:
    base_url: "https://a.example.com"
"#;
        let err = Config::from_yaml(yaml, no_env).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_default_profile_falls_back_to_first() {
        let yaml = r#"
profiles:
  first:
    base_url: "https://a.example.com"
  second:
    base_url: "https://b.example.com"
"#;
        let config = Config::from_yaml(yaml, no_env).unwrap();
        assert_eq!(config.default_profile_name(), Some("first"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let yaml = r#"
profiles:
  broken:
    base_url: "not a url"
"#;
        assert!(Config::from_yaml(yaml, no_env).is_err());
    }

    #[test]
    fn test_env_placeholders_resolved() {
        let yaml = r#"
profiles:
  openrouter:
    base_url: "https://${OR_HOST}/api/v1"
    api_key: "${OR_KEY}"
    headers:
      X-Title: "prefix-${OR_TITLE}"
"#;
        let lookup = |var: &str| match var {
            "OR_HOST" => Some("openrouter.ai".to_string()),
            "OR_KEY" => Some("sk-or-env".to_string()),
            "OR_TITLE" => Some("chub".to_string()),
            _ => None,
        };
        let config = Config::from_yaml(yaml, lookup).unwrap();
        let entry = config.profiles.get("openrouter").unwrap();
        assert_eq!(entry.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(entry.api_key.as_deref(), Some("sk-or-env"));
        assert_eq!(entry.headers.get("X-Title").map(String::as_str), Some("prefix-chub"));
    }

    #[test]
    fn test_unset_api_key_variable_loads_as_missing() {
        let yaml = r#"
profiles:
  openrouter:
    base_url: "https://openrouter.ai/api/v1"
    api_key: "${DEFINITELY_UNSET_VAR}"
"#;
        let config = Config::from_yaml(yaml, no_env).unwrap();
        assert!(config.profiles.get("openrouter").unwrap().api_key.is_none());
    }

    #[test]
    fn test_starter_config_parses() {
        let lookup = |var: &str| (var == "OPENROUTER_API_KEY").then(|| "sk-or".to_string());
        let config = Config::from_yaml(STARTER_CONFIG, lookup).unwrap();
        assert_eq!(config.default_profile_name(), Some("openrouter"));
        let entry = config.profiles.get("openrouter").unwrap();
        assert_eq!(entry.api_key.as_deref(), Some("sk-or"));
        assert!(entry.reasoning.as_ref().is_some_and(|r| r.enabled));
    }

    #[test]
    fn test_write_starter_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        assert!(Config::write_starter(&path).unwrap());
        std::fs::write(&path, "port: 1\n").unwrap();
        assert!(!Config::write_starter(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "port: 1\n");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "port: 8099\nprofiles:\n  local:\n    base_url: \"http://127.0.0.1:1/v1\"\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 8099);
        assert_eq!(config.default_profile_name(), Some("local"));
    }
}
