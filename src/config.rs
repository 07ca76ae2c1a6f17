use std::path::{Path, PathBuf};

use rocket::fairing::{self, Fairing, Info, Kind};
use rocket::{Build, Rocket};
use serde::Deserialize;

use crate::model::biometric::Metric;
use crate::model::store::Engine;

/// Static configuration, extracted from Rocket's figment so values can come
/// from `Rocket.toml` or `ROCKET_`-prefixed environment variables alike.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the voter registry dataset (a JSON map of identifiers).
    registry_path: PathBuf,
    /// Directory holding the append-only journals.
    data_dir: PathBuf,
    /// Lockout TTL imposed on a duplicate-biometric match, in milliseconds.
    lockout_ms: i64,
    /// Similarity metric used for gallery deduplication.
    dedup_metric: Metric,
    /// Match threshold override; defaults to the metric's own threshold.
    dedup_threshold: Option<f64>,
    /// Dimensionality of extracted fingerprint vectors.
    fingerprint_dim: usize,
    /// Electorate size override for turnout; defaults to the registry size.
    eligible_voters: Option<u64>,
    /// Secret key for identifier pseudonymisation in the biometric gallery.
    hmac_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("registry.json"),
            data_dir: PathBuf::from("data"),
            lockout_ms: crate::model::lockout::DEFAULT_LOCKOUT_MS,
            dedup_metric: Metric::Cosine,
            dedup_threshold: None,
            fingerprint_dim: 4096,
            eligible_voters: None,
            hmac_secret: String::new(),
        }
    }
}

impl Config {
    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn lockout_ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.lockout_ms)
    }

    pub fn dedup_metric(&self) -> Metric {
        self.dedup_metric
    }

    pub fn dedup_threshold(&self) -> f64 {
        self.dedup_threshold
            .unwrap_or_else(|| self.dedup_metric.default_threshold())
    }

    pub fn fingerprint_dim(&self) -> usize {
        self.fingerprint_dim
    }

    pub fn eligible_voters(&self) -> Option<u64> {
        self.eligible_voters
    }

    pub fn hmac_secret(&self) -> &[u8] {
        self.hmac_secret.as_bytes()
    }
}

#[cfg(test)]
impl Config {
    /// Configuration rooted at a scratch directory, with a fingerprint
    /// dimensionality small enough for hand-built samples.
    pub fn for_test(dir: &Path) -> Self {
        Self {
            registry_path: dir.join("registry.json"),
            data_dir: dir.join("data"),
            fingerprint_dim: 8,
            hmac_secret: "test-secret".to_string(),
            ..Self::default()
        }
    }
}

/// Loads the registry and replays the journals, placing the resulting
/// `Engine` in managed state. Runs after `Config` extraction; any store
/// corruption aborts ignition.
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Stores",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        let config = match rocket.state::<Config>() {
            Some(config) => config.clone(),
            None => {
                error!("Configuration must be loaded before the stores");
                return Err(rocket);
            }
        };
        match Engine::load(&config) {
            Ok(engine) => Ok(rocket.manage(engine)),
            Err(err) => {
                error!("Failed to load stores: {err}");
                Err(rocket)
            }
        }
    }
}
