//! Runtime configuration: which transport to use, where the runtime lives,
//! which model to ask, and how long to wait.
//!
//! Defaults target a stock Ollama install on localhost. Every field can be
//! overridden from the environment (and therefore from `.env.local` / `.env`,
//! which `lib::load_env_files` loads before anything reads config).

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:3b-instruct-fp16";
pub const DEFAULT_BINARY: &str = "ollama";
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_GENERATE_TIMEOUT_MS: u64 = 120_000;

/// How the runtime is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Local HTTP API (`/api/tags`, `/api/generate`).
    Http,
    /// Spawned command-line process (`ollama list`, `ollama run`).
    Cli,
}

impl Transport {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "http" => Some(Self::Http),
            "cli" | "process" => Some(Self::Cli),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Cli => "cli",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub transport: Transport,
    pub base_url: String,
    pub model: String,
    pub binary: String,
    #[serde(with = "duration_ms")]
    pub probe_timeout: Duration,
    #[serde(with = "duration_ms")]
    pub generate_timeout: Duration,
    /// Model-assisted mode. When false the analyzer and refiner go straight
    /// to the deterministic fallback without touching the runtime.
    pub model_enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Http,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            binary: DEFAULT_BINARY.to_string(),
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            generate_timeout: Duration::from_millis(DEFAULT_GENERATE_TIMEOUT_MS),
            model_enabled: true,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overlaid with whatever the process environment provides.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads through an arbitrary lookup, so tests
    /// don't have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("IMPROVER_TRANSPORT") {
            match Transport::parse(&raw) {
                Some(t) => config.transport = t,
                None => log::warn!("[CONFIG] Ignoring IMPROVER_TRANSPORT={:?}", raw),
            }
        }
        if let Some(host) = lookup("OLLAMA_HOST").filter(|h| !h.trim().is_empty()) {
            config.base_url = normalize_base_url(&host);
        }
        if let Some(model) = lookup("IMPROVER_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(bin) = lookup("OLLAMA_BIN").filter(|b| !b.trim().is_empty()) {
            config.binary = bin.trim().to_string();
        }
        if let Some(ms) = parse_ms(&lookup, "IMPROVER_PROBE_TIMEOUT_MS") {
            config.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_ms(&lookup, "IMPROVER_GENERATE_TIMEOUT_MS") {
            config.generate_timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("IMPROVER_MODEL_ENABLED") {
            match parse_flag(&raw) {
                Some(flag) => config.model_enabled = flag,
                None => log::warn!("[CONFIG] Ignoring IMPROVER_MODEL_ENABLED={:?}", raw),
            }
        }

        config
    }

    /// Copy of this config with model-assisted mode switched on or off.
    pub fn with_model_enabled(mut self, enabled: bool) -> Self {
        self.model_enabled = enabled;
        self
    }
}

/// `OLLAMA_HOST` is often given as `127.0.0.1:11434` without a scheme.
fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

fn parse_ms<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(ms),
        _ => {
            log::warn!("[CONFIG] Ignoring {}={:?}", key, raw);
            None
        }
    }
}

pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
