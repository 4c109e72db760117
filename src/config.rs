use crate::chat::{ChatClient, DEFAULT_CHAT_URL};
use std::{env, path::PathBuf, str::FromStr};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown edition {0:?}, expected 'full' or 'baseline'")]
    UnknownEdition(String),
}

/// Which page variant is served. Baseline has no bookmarks, notes or search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edition {
    Baseline,
    #[default]
    Full,
}

impl FromStr for Edition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(Edition::Baseline),
            "full" => Ok(Edition::Full),
            other => Err(ConfigError::UnknownEdition(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub bookmarks: bool,
    pub notes: bool,
    pub search: bool,
}

impl Edition {
    pub fn features(self) -> Features {
        let full = self == Edition::Full;
        Features {
            bookmarks: full,
            notes: full,
            search: full,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Edition::Baseline => "baseline",
            Edition::Full => "full",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub plan_path: Option<PathBuf>,
    pub chat_url: String,
    pub chat_api_key: Option<String>,
    pub edition: Edition,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let plan_path = lookup("STUDY_PLAN_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let chat_url = lookup("CHAT_API_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_URL.to_string());

        let chat_api_key = lookup("CHAT_API_KEY").filter(|value| !value.trim().is_empty());

        let edition = match lookup("STUDY_PLAN_EDITION") {
            Some(value) => value.parse()?,
            None => Edition::default(),
        };

        Ok(Self {
            port,
            data_path,
            plan_path,
            chat_url,
            chat_api_key,
            edition,
        })
    }

    /// The public endpoint needs a credential. A custom endpoint is used as-is.
    pub fn chat_client(&self) -> Option<ChatClient> {
        match &self.chat_api_key {
            Some(key) => Some(ChatClient::new(&self.chat_url, key)),
            None if self.chat_url != DEFAULT_CHAT_URL => Some(ChatClient::new(&self.chat_url, "")),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.data_path, PathBuf::from("data/state.json"));
        assert_eq!(cfg.plan_path, None);
        assert_eq!(cfg.edition, Edition::Full);
        assert!(cfg.chat_client().is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("PORT", "9001"),
            ("APP_DATA_PATH", "/tmp/plan.json"),
            ("STUDY_PLAN_PATH", "plans/custom.json"),
            ("STUDY_PLAN_EDITION", "Baseline"),
            ("CHAT_API_URL", "http://127.0.0.1:7000/chat"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.data_path, PathBuf::from("/tmp/plan.json"));
        assert_eq!(cfg.plan_path, Some(PathBuf::from("plans/custom.json")));
        assert_eq!(cfg.edition, Edition::Baseline);
        assert!(!cfg.edition.features().bookmarks);
        let client = cfg.chat_client().unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:7000/chat");
    }

    #[test]
    fn bad_port_falls_back() {
        let cfg = config(&[("PORT", "not-a-port")]).unwrap();
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn unknown_edition_is_an_error() {
        assert_eq!(
            config(&[("STUDY_PLAN_EDITION", "deluxe")]).err(),
            Some(ConfigError::UnknownEdition("deluxe".to_string()))
        );
    }

    #[test]
    fn api_key_enables_default_endpoint() {
        let cfg = config(&[("CHAT_API_KEY", "hf_123")]).unwrap();
        assert_eq!(cfg.chat_client().unwrap().endpoint(), DEFAULT_CHAT_URL);
    }
}
