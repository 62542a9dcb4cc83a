use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Endpoint serving the review envelope
pub const DEFAULT_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycbyw-RDRcuS_hmu0eiZiV9qeqbqnjVrQ3jcDpzkiJGYluwN6612k2bhYSaA9NqHlkr-i/exec";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reviews: ReviewsConfig,
    pub site: SiteConfig,
}

/// Review loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewsConfig {
    pub endpoint: String,
    pub poll_interval_secs: u64,
    pub fallback_timeout_secs: u64,
    pub callback_prefix: String,
    pub reveal_base_delay_ms: u64,
    pub reveal_step_ms: u64,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval_secs: 60,
            fallback_timeout_secs: 15,
            callback_prefix: "jsonpCallback_".to_string(),
            reveal_base_delay_ms: 100,
            reveal_step_ms: 100,
        }
    }
}

impl ReviewsConfig {
    /// Reject values the polling timer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("reviews.poll_interval_secs must be at least 1");
        }
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid reviews endpoint: {}", self.endpoint))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback_timeout_secs)
    }

    pub fn reveal_base_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_base_delay_ms)
    }

    pub fn reveal_step(&self) -> Duration {
        Duration::from_millis(self.reveal_step_ms)
    }
}

/// Links for one enrollment plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanLinks {
    pub notes_url: Option<String>,
    pub tasks_url: Option<String>,
    pub gallery_url: Option<String>,
}

/// Keyboard shortcut description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyChord {
    pub ctrl: bool,
    pub alt: bool,
    pub key: String,
}

impl Default for KeyChord {
    fn default() -> Self {
        Self {
            ctrl: true,
            alt: true,
            key: "d".to_string(),
        }
    }
}

impl KeyChord {
    /// Check a key press against the chord, ignoring key case
    pub fn matches(&self, ctrl: bool, alt: bool, key: &str) -> bool {
        self.ctrl == ctrl && self.alt == alt && self.key.eq_ignore_ascii_case(key)
    }
}

/// Static page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub form_embed_url: String,
    pub plans: BTreeMap<String, PlanLinks>,
    pub admin_chord: KeyChord,
    pub notification_secs: u64,
    pub loader_delay_ms: u64,
    pub navbar_scroll_threshold: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let mut plans = BTreeMap::new();
        plans.insert(
            "diario".to_string(),
            PlanLinks {
                notes_url: Some("https://maestrocreamos.github.io/NOTASPLANDIARIO.github.io/".to_string()),
                tasks_url: Some("https://maestrocreamos.github.io/TAREASDIARIO.github.io/".to_string()),
                gallery_url: Some("https://creamos-educacion.infinityfreeapp.com/?i=2".to_string()),
            },
        );
        plans.insert(
            "domingo".to_string(),
            PlanLinks {
                notes_url: Some("https://maestrocreamos.github.io/NOTASDOMINGO.github.io/".to_string()),
                tasks_url: Some("https://maestrocreamos.github.io/TAREADOMINGO.github.io/".to_string()),
                gallery_url: None,
            },
        );

        Self {
            form_embed_url: "https://docs.google.com/forms/d/e/1FAIpQLSeFZdSWzURjpBqSzrpt_SEPI76CkNze6pAR_DCwFUEtXDb-Zw/viewform?embedded=true".to_string(),
            plans,
            admin_chord: KeyChord::default(),
            notification_secs: 5,
            loader_delay_ms: 1500,
            navbar_scroll_threshold: 50.0,
        }
    }
}

impl SiteConfig {
    pub fn plan(&self, name: &str) -> Option<&PlanLinks> {
        self.plans.get(name)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }

    pub fn loader_delay(&self) -> Duration {
        Duration::from_millis(self.loader_delay_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .reviews
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Load configuration from the default location (.reviews-widget/config.yml)
    pub fn load_default() -> Result<Self> {
        Self::load(".reviews-widget/config.yml")
    }
}
