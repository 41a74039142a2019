use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub loader: LoaderSettings,
    #[serde(default)]
    pub demo: DemoSettings,
    /// Remote sources loaded by `fetch` when no URL is given.
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// Tunables of the load state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// Grace period before the placeholder is shown (default: 200).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Simulated source used by the `demo` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoSettings {
    /// Latency of the simulated fetch (default: 2000).
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

/// A named JSON endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub url: String,
}

fn default_timeout_ms() -> u64 {
    200
}

fn default_latency_ms() -> u64 {
    2000
}

impl LoaderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl DemoSettings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
        }
    }
}
