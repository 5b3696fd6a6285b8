use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use config::{Environment, Source};
use lazy_static::lazy_static;

use super::error::Result;

static DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/default_config.toml"));

/// A named bundle of overrides under `presets.<name>`, merged as its own source
#[derive(Debug, Clone, serde::Deserialize)]
struct Preset(HashMap<String, config::Value>);

impl Preset {
    /// Nested tables are flattened to dotted keys, so that a preset only
    /// overrides the leaves it names instead of whole sections.
    fn flatten_into(prefix: &str, value: config::Value, out: &mut HashMap<String, config::Value>) {
        match value.clone().into_table() {
            Ok(table) => {
                for (k, v) in table {
                    Self::flatten_into(&format!("{}{}.", prefix, k), v, out);
                }
            }
            Err(_) => {
                out.insert(prefix.trim_end_matches('.').to_owned(), value);
            }
        }
    }
}

impl config::Source for Preset {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> std::result::Result<HashMap<String, config::Value>, config::ConfigError> {
        let mut kv = HashMap::new();
        for (k, v) in self.0.iter() {
            // make sure it's not getting endlessly recursive
            if k == "presets" {
                continue;
            }
            Self::flatten_into(&format!("{}.", k), v.clone(), &mut kv);
        }
        Ok(kv)
    }
}

/// The main structure holding application config
pub struct AppConfig(config::Config);

impl AppConfig {
    fn new() -> Self {
        // Start with empty
        Self(config::Config::new())
    }

    pub fn setup(&mut self) -> Result<&mut Self> {
        // Merge with default config
        self.0
            .merge(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))?;

        // Merge settings with env variables, e.g. OSSIM_EXPERIMENT__SEED
        self.0
            .merge(Environment::with_prefix("OSSIM").separator("__"))?;

        Ok(self)
    }

    /// Load config from a file
    pub fn use_file(&mut self, path: &Path) -> Result<&mut Self> {
        self.0.merge(config::File::from(path))?;
        Ok(self)
    }

    /// Load preset
    pub fn use_preset(&mut self, name: &str) -> Result<&mut Self> {
        let preset: Preset = self.get(format!("presets.{}", name))?;
        self.0.merge(preset)?;
        Ok(self)
    }

    /// Get a single value and deserialize to the given type
    pub fn get<T, K>(&self, key: K) -> Result<T>
    where
        // use DeserializeOwned, because we are reading CONFIG using RWLock
        // and the lock is released before returning. So T should not borrow
        // anything from CONFIG.
        T: serde::de::DeserializeOwned,
        K: AsRef<str>,
    {
        Ok(self.0.get(key.as_ref())?)
    }

    /// Deserialize the whole config tree to the given type
    pub fn fetch<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let t = self.0.clone().try_into()?;
        Ok(t)
    }
}

lazy_static! {
    /// global AppConfig instance
    static ref CONFIG: RwLock<AppConfig> = RwLock::new(AppConfig::new());
}

pub fn setup() -> Result<()> {
    config_mut().setup()?;
    Ok(())
}

/// global AppConfig instance
pub fn config() -> RwLockReadGuard<'static, AppConfig> {
    // a poisoned lock only means a reader panicked, the config itself is intact
    CONFIG.read().unwrap_or_else(|e| e.into_inner())
}

/// mutable global AppConfig instance
pub fn config_mut() -> RwLockWriteGuard<'static, AppConfig> {
    CONFIG.write().unwrap_or_else(|e| e.into_inner())
}

pub mod prelude {
    pub use super::{config, config_mut};
}
